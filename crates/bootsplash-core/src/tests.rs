use std::fs;
use std::io;
use std::path::PathBuf;

use super::*;

fn sniff_bytes(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> Result<ArchiveKind, HelperError> {
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("must write sniff fixture");
    ArchiveKind::sniff(&path)
}

#[test]
fn sniff_recognizes_zip_magic() {
    let dir = tempfile::tempdir().expect("must create tempdir");
    let kind = sniff_bytes(&dir, "bundle", b"PK\x03\x04rest-of-archive").expect("must sniff");
    assert_eq!(kind, ArchiveKind::Zip);

    let empty = sniff_bytes(&dir, "empty", b"PK\x05\x06\0\0\0\0").expect("must sniff");
    assert_eq!(empty, ArchiveKind::Zip);
}

#[test]
fn sniff_recognizes_compressed_tar_magics() {
    let dir = tempfile::tempdir().expect("must create tempdir");

    let gz = sniff_bytes(&dir, "a", &[0x1f, 0x8b, 0x08, 0x00]).expect("must sniff");
    assert_eq!(gz, ArchiveKind::Tar(TarCompression::Gzip));

    let bz = sniff_bytes(&dir, "b", b"BZh91AY").expect("must sniff");
    assert_eq!(bz, ArchiveKind::Tar(TarCompression::Bzip2));

    let xz = sniff_bytes(&dir, "c", &[0xfd, b'7', b'z', b'X', b'Z', 0x00, 0x00]).expect("must sniff");
    assert_eq!(xz, ArchiveKind::Tar(TarCompression::Xz));

    let lzma = sniff_bytes(&dir, "d", &[0x5d, 0x00, 0x00, 0x80, 0x00]).expect("must sniff");
    assert_eq!(lzma, ArchiveKind::Tar(TarCompression::Lzma));
}

#[test]
fn sniff_recognizes_plain_tar_by_ustar_magic() {
    let dir = tempfile::tempdir().expect("must create tempdir");
    let mut block = vec![0u8; 512];
    block[257..262].copy_from_slice(b"ustar");
    let kind = sniff_bytes(&dir, "plain", &block).expect("must sniff");
    assert_eq!(kind, ArchiveKind::Tar(TarCompression::None));
}

#[test]
fn sniff_rejects_unrecognized_content() {
    let dir = tempfile::tempdir().expect("must create tempdir");
    let err = sniff_bytes(&dir, "notes.txt", b"just some plain text").expect_err("must reject");
    assert!(matches!(err, HelperError::UnknownFormat { .. }));
}

#[test]
fn sniff_ignores_misleading_extension() {
    let dir = tempfile::tempdir().expect("must create tempdir");
    // gzip content behind a .zip name must still resolve to the tar family
    let kind = sniff_bytes(&dir, "lying.zip", &[0x1f, 0x8b, 0x08, 0x00]).expect("must sniff");
    assert_eq!(kind, ArchiveKind::Tar(TarCompression::Gzip));
}

#[test]
fn sniff_missing_file_is_open_failure() {
    let err = ArchiveKind::sniff(&PathBuf::from("/nonexistent/archive")).expect_err("must fail");
    assert!(matches!(err, HelperError::OpenFailed { .. }));
}

#[test]
fn archive_kind_names() {
    assert_eq!(ArchiveKind::Zip.as_str(), "zip");
    assert_eq!(ArchiveKind::Tar(TarCompression::None).as_str(), "tar");
    assert_eq!(ArchiveKind::Tar(TarCompression::Gzip).as_str(), "tar.gz");
    assert_eq!(ArchiveKind::Tar(TarCompression::Xz).as_str(), "tar.xz");
}

#[test]
fn parse_action_requests() {
    let save: ActionRequest =
        serde_json::from_str(r#"{"action":"save","theme":"ocean"}"#).expect("must parse");
    assert_eq!(
        save,
        ActionRequest::Save {
            theme: "ocean".to_string()
        }
    );

    let install: ActionRequest =
        serde_json::from_str(r#"{"action":"install","themearchive":"/tmp/ocean.zip"}"#)
            .expect("must parse");
    assert_eq!(
        install,
        ActionRequest::Install {
            themearchive: "/tmp/ocean.zip".to_string()
        }
    );

    let uninstall: ActionRequest =
        serde_json::from_str(r#"{"action":"uninstall","theme":"ocean"}"#).expect("must parse");
    assert_eq!(
        uninstall,
        ActionRequest::Uninstall {
            theme: "ocean".to_string()
        }
    );
}

#[test]
fn parse_rejects_unknown_action_and_missing_argument() {
    serde_json::from_str::<ActionRequest>(r#"{"action":"format"}"#).expect_err("must reject");
    serde_json::from_str::<ActionRequest>(r#"{"action":"save"}"#).expect_err("must reject");
    serde_json::from_str::<ActionRequest>("{}").expect_err("must reject");
}

#[test]
fn success_reply_serializes_without_error_fields() {
    let raw = serde_json::to_string(&ActionReply::success()).expect("must serialize");
    assert_eq!(raw, r#"{"outcome":"success"}"#);
}

#[test]
fn reply_outcome_mapping() {
    let validation = ActionReply::from_error(&HelperError::EmptyArgument { name: "theme" });
    assert_eq!(validation.outcome, ReplyOutcome::ValidationError);
    assert_eq!(validation.error_code, None);
    assert!(validation
        .error_description
        .as_deref()
        .expect("must describe")
        .contains("theme"));

    let backend = ActionReply::from_error(&HelperError::NotFound {
        name: "ocean".to_string(),
    });
    assert_eq!(backend.outcome, ReplyOutcome::BackendError);

    let helper = ActionReply::from_error(&HelperError::CommandFailed {
        command: "/usr/sbin/update-initramfs".to_string(),
        code: 1,
    });
    assert_eq!(helper.outcome, ReplyOutcome::HelperError);
    assert_eq!(helper.error_code, Some(1));
}

#[test]
fn error_description_includes_source_chain() {
    let err = HelperError::OpenFailed {
        path: PathBuf::from("/tmp/bundle.zip"),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
    };
    let description = err.description();
    assert!(description.contains("/tmp/bundle.zip"));
    assert!(description.contains("permission denied"));
}

#[test]
fn helper_message_round_trip() {
    let mut data = std::collections::BTreeMap::new();
    data.insert("plugin".to_string(), "ocean".to_string());
    data.insert("path".to_string(), "/usr/share/bootsplash/themes/ocean".to_string());

    let progress = HelperMessage::Progress { data: data.clone() };
    let raw = serde_json::to_string(&progress).expect("must serialize");
    assert!(raw.starts_with(r#"{"event":"progress""#));
    let parsed: HelperMessage = serde_json::from_str(&raw).expect("must parse");
    assert_eq!(parsed, progress);

    let reply = HelperMessage::Reply {
        reply: ActionReply::success_with_data(data),
    };
    let raw = serde_json::to_string(&reply).expect("must serialize");
    let parsed: HelperMessage = serde_json::from_str(&raw).expect("must parse");
    assert_eq!(parsed, reply);
}
