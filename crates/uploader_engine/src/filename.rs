use rand::Rng;

/// URL-safe alphabet for generated ids.
const ID_ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

pub const UPLOAD_ID_LEN: usize = 12;

/// Upload filename: `{prefix}-{12 char id}.mp4`.
///
/// Uniqueness rests on a non-cryptographic random id. The prefix is
/// validated by [`crate::UploadConfig::with_filename_prefix`].
pub fn upload_filename(prefix: &str) -> String {
    let id = random_id(UPLOAD_ID_LEN);
    format!("{prefix}-{id}.mp4")
}

pub fn random_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Prefixes are limited to the same URL-safe alphabet as the ids.
pub(crate) fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix.len() <= MAX_PREFIX_LEN
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

const MAX_PREFIX_LEN: usize = 40;
