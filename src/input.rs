//! Loading account data from disk

use log::debug;
use std::fs;
use std::path::Path;

use crate::errors::{ErrorContext, ErrorExt, InspectorError, InspectorResult};

/// How account data is stored in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEncoding {
    /// Raw bytes, e.g. a dumped program
    Binary,
    /// Base64 text, either bare or as the RPC `["<data>", "base64"]` pair
    Base64,
}

/// Decode base64 account data. Whitespace is ignored.
pub fn decode_account_data(text: &str) -> InspectorResult<Vec<u8>> {
    let text = text.trim();

    let encoded = if text.starts_with('[') {
        let parts: Vec<String> = serde_json::from_str(text)?;
        match parts.as_slice() {
            [data] => data.clone(),
            [data, encoding] if encoding == "base64" => data.clone(),
            [_, encoding] => {
                return Err(InspectorError::InvalidInput(format!(
                    "Unsupported account data encoding: {}",
                    encoding
                )))
            }
            _ => {
                return Err(InspectorError::InvalidInput(
                    "Expected [data, encoding] account data array".to_string(),
                ))
            }
        }
    } else {
        text.to_string()
    };

    let compact: String = encoded.split_whitespace().collect();
    Ok(base64::decode(compact)?)
}

/// Read account data from `path`
pub fn read_account_data(path: &Path, encoding: InputEncoding) -> InspectorResult<Vec<u8>> {
    let context = || ErrorContext {
        buffer_len: None,
        component: "input".to_string(),
        operation: "reading account data".to_string(),
        details: Some(path.display().to_string()),
    };

    let data = match encoding {
        InputEncoding::Binary => fs::read(path).with_context(context())?,
        InputEncoding::Base64 => {
            let text = fs::read_to_string(path).with_context(context())?;
            decode_account_data(&text)?
        }
    };

    debug!("Read {} bytes of account data from {}", data.len(), path.display());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decode_bare_base64() {
        assert_eq!(decode_account_data("AQID\n").unwrap(), vec![1, 2, 3]);
        assert_eq!(decode_account_data("AQ ID").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_rpc_pair() {
        assert_eq!(decode_account_data(r#"["AQID", "base64"]"#).unwrap(), vec![1, 2, 3]);

        let err = decode_account_data(r#"["AQID", "base58"]"#).unwrap_err();
        assert!(matches!(err, InspectorError::InvalidInput(_)));
        assert!(matches!(decode_account_data("[]"), Err(InspectorError::InvalidInput(_))));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_account_data("not base64!"), Err(InspectorError::Decode(_))));
        assert!(matches!(decode_account_data("[1, 2"), Err(InspectorError::Json(_))));
    }

    #[test]
    fn test_read_files() {
        let mut binary = tempfile::NamedTempFile::new().unwrap();
        binary.write_all(&[0x95, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(read_account_data(binary.path(), InputEncoding::Binary).unwrap().len(), 8);

        let mut text = tempfile::NamedTempFile::new().unwrap();
        write!(text, "lQAAAAAAAAA=").unwrap();
        assert_eq!(
            read_account_data(text.path(), InputEncoding::Base64).unwrap(),
            vec![0x95, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        match read_account_data(&dir.path().join("absent.so"), InputEncoding::Binary).unwrap_err() {
            InspectorError::Io(err) => assert_eq!(err.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_inputs_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_account_data(dir.path(), InputEncoding::Binary).unwrap_err();
        assert!(matches!(err, InspectorError::Io(_)), "directory read gave {:?}", err);

        let mut binary = tempfile::NamedTempFile::new().unwrap();
        binary.write_all(&[0xff, 0xfe, 0x00, 0x80]).unwrap();
        match read_account_data(binary.path(), InputEncoding::Base64).unwrap_err() {
            InspectorError::Io(err) => assert_eq!(err.kind(), std::io::ErrorKind::InvalidData),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }
}
