/// Text encodings for fixed-width string fields
use encoding_rs::SHIFT_JIS;

/// Converts between fixed-width byte fields and `String`.
///
/// `decode` receives the whole field including NUL padding. `encode`
/// returns `None` when `text` has characters the encoding cannot represent.
pub trait TextEncoding {
    fn decode(&self, bytes: &[u8]) -> String;

    fn encode(&self, text: &str) -> Option<Vec<u8>>;
}

/// Shift-JIS (cp932), the code page of the model format
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftJis;

impl TextEncoding for ShiftJis {
    fn decode(&self, bytes: &[u8]) -> String {
        let (text, _) = SHIFT_JIS.decode_without_bom_handling(until_nul(bytes));
        text.into_owned()
    }

    fn encode(&self, text: &str) -> Option<Vec<u8>> {
        // unmappable characters come back as numeric character references
        let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
        (!had_errors).then(|| bytes.into_owned())
    }
}

/// UTF-8, invalid sequences replaced
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl TextEncoding for Utf8 {
    fn decode(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(until_nul(bytes)).into_owned()
    }

    fn encode(&self, text: &str) -> Option<Vec<u8>> {
        Some(text.as_bytes().to_vec())
    }
}

/// Field contents up to the first NUL; bytes after it are padding
pub fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_jis_decode() {
        // "初音ミク"
        let bytes = [
            0x8f, 0x89, 0x89, 0xb9, 0x83, 0x7e, 0x83, 0x4e, 0x00, 0xfd, 0xfd,
        ];
        assert_eq!(ShiftJis.decode(&bytes), "初音ミク");
    }

    #[test]
    fn test_shift_jis_round_trip() {
        let text = "標準モデル";
        let bytes = ShiftJis.encode(text).unwrap();
        assert_eq!(bytes.len(), 10);
        assert_eq!(ShiftJis.decode(&bytes), text);
    }

    #[test]
    fn test_shift_jis_rejects_unmappable() {
        assert_eq!(ShiftJis.encode("é"), None);
        assert_eq!(ShiftJis.encode("ミク😀"), None);
        assert_eq!(Utf8.encode("é😀"), Some("é😀".as_bytes().to_vec()));
    }

    #[test]
    fn test_padding_cut_at_first_nul() {
        assert_eq!(Utf8.decode(b"tex.bmp\0\0garbage"), "tex.bmp");
        assert_eq!(Utf8.decode(b"\0\0\0"), "");
        assert_eq!(until_nul(b"full"), b"full");
    }
}
