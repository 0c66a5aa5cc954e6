use thiserror::Error;

#[derive(Error, Debug)]
pub enum EuvmError {
    #[error("Unable to read the configuration file {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid configuration document: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Unable to resolve the home directory for path: {0}")]
    HomeDirNotFound(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(String),

    #[error("Not an IDL SAVE file (signature {0:?})")]
    InvalidSavSignature(Vec<u8>),

    #[error("Unsupported IDL SAVE record format: {0:?}")]
    InvalidRecordFormat(Vec<u8>),

    #[error("Unknown IDL SAVE record type: {0}")]
    UnknownRecordType(i32),

    #[error("IDL SAVE decoding failed at byte {offset}: {reason}")]
    SavDecode { offset: usize, reason: String },

    #[error("Unsupported IDL SAVE content: {0}")]
    Unsupported(String),

    #[error("Failed to inflate a compressed IDL SAVE record: {0}")]
    Decompression(String),

    #[error("Variable '{0}' not found in save file")]
    MissingVariable(String),

    #[error("Variable '{variable}' does not match the expected schema: {reason}")]
    SchemaMismatch { variable: String, reason: String },

    #[error("Invalid binning parameter: {0}")]
    InvalidBinningParameter(String),

    #[error("Degenerate binning domain: {0}")]
    DegenerateBinning(String),

    #[error("No observation left after filtering: {0}")]
    EmptySelection(String),

    #[error("Length mismatch: {left} heights for {right} temperatures")]
    LengthMismatch { left: usize, right: usize },

    #[error("Presenter failure: {0}")]
    Presenter(String),
}

impl PartialEq for EuvmError {
    fn eq(&self, other: &Self) -> bool {
        use EuvmError::*;
        match (self, other) {
            (ConfigRead { path: a, .. }, ConfigRead { path: b, .. }) => a == b,
            (HomeDirNotFound(a), HomeDirNotFound(b)) => a == b,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,
            (Pattern(a), Pattern(b)) => a == b,
            (InvalidSavSignature(a), InvalidSavSignature(b)) => a == b,
            (InvalidRecordFormat(a), InvalidRecordFormat(b)) => a == b,
            (UnknownRecordType(a), UnknownRecordType(b)) => a == b,
            (
                SavDecode {
                    offset: a,
                    reason: ra,
                },
                SavDecode {
                    offset: b,
                    reason: rb,
                },
            ) => a == b && ra == rb,
            (Unsupported(a), Unsupported(b)) => a == b,
            (Decompression(a), Decompression(b)) => a == b,
            (MissingVariable(a), MissingVariable(b)) => a == b,
            (
                SchemaMismatch {
                    variable: a,
                    reason: ra,
                },
                SchemaMismatch {
                    variable: b,
                    reason: rb,
                },
            ) => a == b && ra == rb,
            (InvalidBinningParameter(a), InvalidBinningParameter(b)) => a == b,
            (DegenerateBinning(a), DegenerateBinning(b)) => a == b,
            (EmptySelection(a), EmptySelection(b)) => a == b,
            (LengthMismatch { left: a, right: ra }, LengthMismatch { left: b, right: rb }) => {
                a == b && ra == rb
            }
            (Presenter(a), Presenter(b)) => a == b,

            // These errors carry foreign payloads: equal if same variant
            (ConfigParse(_), ConfigParse(_)) => true,
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            _ => false,
        }
    }
}
