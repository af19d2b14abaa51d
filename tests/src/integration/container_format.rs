//! # Container Format Checks
//!
//! Byte-level assertions against an exported container: field placement,
//! fixed-IV header encryption, size arithmetic and the signed trailer. These
//! pin the on-disk layout independently of the parsing code.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        ephemeral_keys, internal_storage, populated_save_fs, TEST_DEVICE_ID, TEST_TITLE_ID,
    };
    use save_storage::domain::layout::{
        align_up, SaveHeader, BANNER_MIN_SIZE, BK_DECLARED_SIZE, BK_HEADER_SIZE, BK_MAGIC,
        BLOCK_SIZE, FILE_RECORD_MAGIC, FILE_RECORD_SIZE, FULL_CERT_SIZE, HEADER_IV, HEADER_SIZE,
        SIGNATURE_SIZE, TRAILING_MAGIC,
    };
    use save_storage::{
        export_save, SoftwareKeyService, TitleId, TransferOutcome, CONTAINER_FILE_NAME,
        DEFAULT_TRANSFER_KEY,
    };
    use shared_crypto::{decrypt, sha256, DeviceKey, EcdsaSignature, Iv, TransferKey};
    use std::path::PathBuf;
    use std::sync::Arc;

    // Populated fixture: one directory record plus two file records.
    // 3 * 0x80 + align(0x40) + align(0x135) = 0x300.
    const EXPECTED_SIZE_OF_ENTRIES: u32 = 3 * FILE_RECORD_SIZE as u32
        + align_up(0x40, BLOCK_SIZE)
        + align_up(0x135, BLOCK_SIZE);

    fn export_with(keys: Arc<SoftwareKeyService>) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let source = internal_storage(populated_save_fs());
        assert_eq!(
            export_save(&source, dir.path(), keys),
            TransferOutcome::Success
        );
        let path = dir
            .path()
            .join(TitleId::new(TEST_TITLE_ID).export_dir_name())
            .join(CONTAINER_FILE_NAME);
        (dir, path)
    }

    #[test]
    fn test_header_encrypted_with_fixed_iv() {
        let device_key = DeviceKey::generate();
        let keys = Arc::new(SoftwareKeyService::new(
            TransferKey::from_bytes(DEFAULT_TRANSFER_KEY),
            device_key,
            TEST_DEVICE_ID,
        ));
        let (_dir, path) = export_with(keys);
        let bytes = std::fs::read(&path).unwrap();

        let transfer_key = TransferKey::from_bytes(DEFAULT_TRANSFER_KEY);
        let plaintext = decrypt(
            &transfer_key,
            &Iv::from_bytes(HEADER_IV),
            &bytes[..HEADER_SIZE],
        )
        .unwrap();

        assert_eq!(
            u64::from_be_bytes(plaintext[0x00..0x08].try_into().unwrap()),
            TEST_TITLE_ID
        );
        assert_eq!(
            u32::from_be_bytes(plaintext[0x08..0x0C].try_into().unwrap()),
            BANNER_MIN_SIZE
        );
        assert!(SaveHeader::verify_digest(&plaintext));
    }

    #[test]
    fn test_bk_header_is_plaintext_and_placed_after_header() {
        let (_dir, path) = export_with(ephemeral_keys());
        let bytes = std::fs::read(&path).unwrap();
        let bk = &bytes[HEADER_SIZE..HEADER_SIZE + BK_HEADER_SIZE];

        assert_eq!(
            u32::from_be_bytes(bk[0x00..0x04].try_into().unwrap()),
            BK_DECLARED_SIZE
        );
        assert_eq!(u32::from_be_bytes(bk[0x04..0x08].try_into().unwrap()), BK_MAGIC);
        assert_eq!(
            u32::from_be_bytes(bk[0x08..0x0C].try_into().unwrap()),
            TEST_DEVICE_ID
        );
        assert_eq!(u32::from_be_bytes(bk[0x0C..0x10].try_into().unwrap()), 3);
        assert_eq!(
            u32::from_be_bytes(bk[0x10..0x14].try_into().unwrap()),
            EXPECTED_SIZE_OF_ENTRIES
        );
        assert_eq!(
            u32::from_be_bytes(bk[0x1C..0x20].try_into().unwrap()),
            EXPECTED_SIZE_OF_ENTRIES + FULL_CERT_SIZE as u32
        );
        assert_eq!(
            u64::from_be_bytes(bk[0x60..0x68].try_into().unwrap()),
            TEST_TITLE_ID
        );
    }

    #[test]
    fn test_file_records_carry_magic_and_names() {
        let (_dir, path) = export_with(ephemeral_keys());
        let bytes = std::fs::read(&path).unwrap();

        // Directory-first preorder with sorted siblings.
        let expected = [
            ("slot0", 2u8, 0u32),
            ("slot0/options.cfg", 1u8, 0x40),
            ("slot0/progress.sav", 1u8, 0x135),
        ];

        let mut offset = HEADER_SIZE + BK_HEADER_SIZE;
        for (name, kind, size) in expected {
            let record = &bytes[offset..offset + FILE_RECORD_SIZE];
            assert_eq!(
                u32::from_be_bytes(record[0x00..0x04].try_into().unwrap()),
                FILE_RECORD_MAGIC
            );
            assert_eq!(u32::from_be_bytes(record[0x04..0x08].try_into().unwrap()), size);
            assert_eq!(record[0x0A], kind);
            let name_field = &record[0x0B..0x0B + name.len() + 1];
            assert_eq!(&name_field[..name.len()], name.as_bytes());
            assert_eq!(name_field[name.len()], 0);

            offset += FILE_RECORD_SIZE + align_up(size, BLOCK_SIZE) as usize;
        }
        assert_eq!(
            offset,
            HEADER_SIZE + BK_HEADER_SIZE + EXPECTED_SIZE_OF_ENTRIES as usize
        );
    }

    #[test]
    fn test_file_payloads_are_not_stored_in_the_clear() {
        let (_dir, path) = export_with(ephemeral_keys());
        let bytes = std::fs::read(&path).unwrap();

        // First file payload: after the directory record and the first file
        // record. Plaintext would start with options.cfg fixture bytes.
        let payload_at = HEADER_SIZE + BK_HEADER_SIZE + 2 * FILE_RECORD_SIZE;
        let payload = &bytes[payload_at..payload_at + 0x40];
        let fixture = crate::fixtures::payload_bytes(0x40);
        assert_ne!(payload, &fixture[..]);
    }

    #[test]
    fn test_trailer_signature_and_magic() {
        let keys = ephemeral_keys();
        let (_dir, path) = export_with(keys.clone());
        let bytes = std::fs::read(&path).unwrap();

        let span_end = HEADER_SIZE + BK_HEADER_SIZE + EXPECTED_SIZE_OF_ENTRIES as usize;
        assert_eq!(bytes.len(), span_end + FULL_CERT_SIZE);

        let digest = sha256(&bytes[HEADER_SIZE..span_end]);
        let mut sig = [0u8; SIGNATURE_SIZE];
        sig.copy_from_slice(&bytes[span_end..span_end + SIGNATURE_SIZE]);
        DeviceKey::verify_digest(
            &keys.public_key_bytes(),
            &digest,
            &EcdsaSignature::from_bytes(sig),
        )
        .unwrap();

        let magic_at = span_end + SIGNATURE_SIZE;
        assert_eq!(
            u32::from_be_bytes(bytes[magic_at..magic_at + 4].try_into().unwrap()),
            TRAILING_MAGIC
        );
    }
}
