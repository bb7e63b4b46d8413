use std::fs;
use std::path::{Path, PathBuf};

use packrat_archive::{
    ArchiveType, CompressRequest, Error, ExtractRequest, analyze, compare, compress, detect,
    extract,
};
use walkdir::WalkDir;

const ROUND_TRIP_TYPES: [ArchiveType; 3] = [ArchiveType::Zip, ArchiveType::Tar, ArchiveType::TarGz];

fn temp(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temp dir")
}

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_tree(root: &Path) {
    write(root, "README.md", b"# sample\n");
    write(root, "src/main.rs", b"fn main() {}\n");
    write(root, "src/util/mod.rs", b"pub fn util() {}\n");
    write(root, "assets/blob.bin", &(0u8..=255).cycle().take(4096).collect::<Vec<_>>());
}

fn archive_path(dir: &Path, stem: &str, ty: ArchiveType) -> PathBuf {
    dir.join(format!("{stem}.{}", ty.extension().unwrap()))
}

fn regular_files(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let rel = rel.to_string_lossy().replace('\\', "/");
            (rel, fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn round_trip_reproduces_every_file() {
    let work = temp("packrat-roundtrip-");
    let src = work.path().join("src");
    sample_tree(&src);

    for ty in ROUND_TRIP_TYPES {
        for level in [0, 1, 6, 9, 42] {
            let archive = archive_path(work.path(), &format!("out-{level}"), ty);
            compress(&CompressRequest::new(&src, &archive, ty).level(level))
                .unwrap_or_else(|e| panic!("{ty} level {level}: {e}"));

            let dest = work.path().join(format!("dest-{ty}-{level}"));
            extract(&ExtractRequest::new(&archive, &dest, ty))
                .unwrap_or_else(|e| panic!("{ty} level {level}: {e}"));

            assert_eq!(regular_files(&src), regular_files(&dest), "{ty} level {level}");
        }
    }
}

#[cfg(unix)]
#[test]
fn round_trip_preserves_permissions_on_request() {
    use std::os::unix::fs::PermissionsExt;

    let work = temp("packrat-perms-");
    let src = work.path().join("src");
    write(&src, "bin/tool", b"#!/bin/sh\necho hi\n");
    write(&src, "data/readonly.txt", b"frozen");
    fs::set_permissions(src.join("bin/tool"), fs::Permissions::from_mode(0o755)).unwrap();
    fs::set_permissions(src.join("data/readonly.txt"), fs::Permissions::from_mode(0o444))
        .unwrap();

    for ty in ROUND_TRIP_TYPES {
        let archive = archive_path(work.path(), "perms", ty);
        compress(&CompressRequest::new(&src, &archive, ty)).unwrap();

        let dest = work.path().join(format!("dest-{ty}"));
        extract(&ExtractRequest::new(&archive, &dest, ty).preserve_permissions(true)).unwrap();

        let mode = |rel: &str| fs::metadata(dest.join(rel)).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode("bin/tool"), 0o755, "{ty}");
        assert_eq!(mode("data/readonly.txt"), 0o444, "{ty}");
    }
}

#[test]
fn analyze_is_idempotent() {
    let work = temp("packrat-analyze-");
    let src = work.path().join("src");
    sample_tree(&src);

    for ty in ROUND_TRIP_TYPES {
        let archive = archive_path(work.path(), "idem", ty);
        compress(&CompressRequest::new(&src, &archive, ty)).unwrap();

        let first = analyze(&archive, ty).unwrap();
        let second = analyze(&archive, ty).unwrap();
        assert_eq!(first.file_count, second.file_count, "{ty}");
        assert_eq!(first.total_size, second.total_size, "{ty}");
        assert_eq!(first.checksum, second.checksum, "{ty}");
        assert_eq!(first.archive_type, ty);
    }
}

#[test]
fn excluded_files_are_absent_from_listing() {
    let work = temp("packrat-exclude-");
    let src = work.path().join("src");
    write(&src, "app.rs", b"code");
    write(&src, "debug.log", b"noise");
    write(&src, "nested/trace.log", b"more noise");
    write(&src, "nested/keep.txt", b"keep");

    for ty in ROUND_TRIP_TYPES {
        let archive = archive_path(work.path(), "filtered", ty);
        compress(&CompressRequest::new(&src, &archive, ty).exclude(["*.log"])).unwrap();

        let info = analyze(&archive, ty).unwrap();
        let names: Vec<_> = info.files.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"app.rs"), "{ty}: {names:?}");
        assert!(names.contains(&"nested/keep.txt"), "{ty}: {names:?}");
        assert!(!names.iter().any(|n| n.ends_with(".log")), "{ty}: {names:?}");
    }
}

#[test]
fn include_patterns_restrict_files() {
    let work = temp("packrat-include-");
    let src = work.path().join("src");
    sample_tree(&src);

    let archive = work.path().join("rust-only.zip");
    compress(&CompressRequest::new(&src, &archive, ArchiveType::Zip).include(["*.rs"])).unwrap();

    let info = analyze(&archive, ArchiveType::Zip).unwrap();
    let names: Vec<_> = info.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["src/main.rs", "src/util/mod.rs"]);
}

#[test]
fn two_plain_files_scenario() {
    let work = temp("packrat-scenario-");
    let src = work.path().join("source");
    write(&src, "a.txt", b"aaaaaaaa");
    write(&src, "b.txt", b"bbbbbbbb");

    let archive = work.path().join("out.zip");
    compress(&CompressRequest::new(&src, &archive, ArchiveType::Zip)).unwrap();
    let info = analyze(&archive, ArchiveType::Zip).unwrap();

    assert_eq!(info.file_count, 2);
    assert_eq!(info.total_size, 16);
    assert_eq!(info.checksum.len(), 64);
    assert!(info.checksum.chars().all(|c| c.is_ascii_hexdigit()));
    let names: Vec<_> = info.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
}

#[test]
fn listing_is_capped_at_one_hundred() {
    let work = temp("packrat-cap-");
    let src = work.path().join("many");
    for i in 0..130 {
        write(&src, &format!("f{i:03}.txt"), b"xy");
    }

    let archive = work.path().join("many.tar");
    compress(&CompressRequest::new(&src, &archive, ArchiveType::Tar)).unwrap();
    let info = analyze(&archive, ArchiveType::Tar).unwrap();
    assert_eq!(info.file_count, 130);
    assert_eq!(info.total_size, 260);
    assert_eq!(info.files.len(), packrat_archive::LISTING_LIMIT);
}

#[test]
fn compare_same_source_is_identical() {
    let work = temp("packrat-compare-same-");
    let src = work.path().join("src");
    sample_tree(&src);

    for ty in ROUND_TRIP_TYPES {
        let a = archive_path(work.path(), "a", ty);
        let b = archive_path(work.path(), "b", ty);
        compress(&CompressRequest::new(&src, &a, ty)).unwrap();
        compress(&CompressRequest::new(&src, &b, ty)).unwrap();

        let result = compare(&a, ty, &b, ty).unwrap();
        assert!(result.only_in_first.is_empty(), "{ty}");
        assert!(result.only_in_second.is_empty(), "{ty}");
        assert!(result.different.is_empty(), "{ty}");
        for file in ["README.md", "src/main.rs", "src/util/mod.rs", "assets/blob.bin"] {
            assert!(result.in_both.iter().any(|n| n == file), "{ty}: {file}");
        }
    }
}

#[test]
fn compare_detects_changed_content_length() {
    let work = temp("packrat-compare-diff-");
    let left = work.path().join("left");
    let right = work.path().join("right");
    write(&left, "shared.txt", b"short");
    write(&left, "left-only.txt", b"l");
    write(&right, "shared.txt", b"considerably longer");
    write(&right, "right-only.txt", b"r");

    let a = work.path().join("left.zip");
    let b = work.path().join("right.tar.gz");
    compress(&CompressRequest::new(&left, &a, ArchiveType::Zip)).unwrap();
    compress(&CompressRequest::new(&right, &b, ArchiveType::TarGz)).unwrap();

    let result = compare(&a, ArchiveType::Zip, &b, ArchiveType::TarGz).unwrap();
    assert_eq!(result.only_in_first, vec!["left-only.txt"]);
    assert_eq!(result.only_in_second, vec!["right-only.txt"]);
    assert_eq!(result.in_both, vec!["shared.txt"]);
    assert_eq!(result.different.len(), 1);
    let diff = &result.different[0];
    assert_eq!(diff.name, "shared.txt");
    assert_eq!(diff.size_first, 5);
    assert_eq!(diff.size_second, 19);
    assert!(result.summary.contains("Different: 1"));
}

#[test]
fn detection_scenarios() {
    let work = temp("packrat-detect-");

    let misleading = work.path().join("x.tar.gz");
    fs::write(&misleading, b"PK\x03\x04 but the name wins").unwrap();
    assert_eq!(detect(&misleading).unwrap(), ArchiveType::TarGz);

    let unnamed = work.path().join("payload");
    fs::write(&unnamed, [0x50, 0x4B, 0x05, 0x06]).unwrap();
    assert_eq!(detect(&unnamed).unwrap(), ArchiveType::Zip);

    let src = work.path().join("src");
    sample_tree(&src);
    let tar = work.path().join("plain.tar");
    compress(&CompressRequest::new(&src, &tar, ArchiveType::Tar)).unwrap();
    let renamed = work.path().join("plain.bin");
    fs::rename(&tar, &renamed).unwrap();
    assert_eq!(detect(&renamed).unwrap(), ArchiveType::Tar);
}

#[test]
fn rar_compression_is_always_unsupported() {
    let work = temp("packrat-rar-");
    let src = work.path().join("src");
    sample_tree(&src);

    for request in [
        CompressRequest::new(&src, work.path().join("out.rar"), ArchiveType::Rar),
        CompressRequest::new("", "", ArchiveType::Rar),
        CompressRequest::new("/definitely/missing", "/nowhere/out.rar", ArchiveType::Rar),
    ] {
        let err = compress(&request).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCompression { .. }));
        assert!(err.to_string().contains("RAR compression is not supported"));
    }
    assert!(!work.path().join("out.rar").exists());
}

#[test]
fn corrupt_archives_fail_whole_operation() {
    let work = temp("packrat-corrupt-");
    let src = work.path().join("src");
    sample_tree(&src);

    let archive = work.path().join("cut.tar.gz");
    compress(&CompressRequest::new(&src, &archive, ArchiveType::TarGz)).unwrap();
    let bytes = fs::read(&archive).unwrap();
    fs::write(&archive, &bytes[..bytes.len() / 3]).unwrap();

    let err = extract(&ExtractRequest::new(&archive, work.path().join("dest"), ArchiveType::TarGz))
        .unwrap_err();
    assert!(matches!(err, Error::Corrupted { .. }), "{err}");
}

#[test]
fn gzip_single_file_round_trip() {
    let work = temp("packrat-gzip-");
    let file = work.path().join("notes.txt");
    fs::write(&file, b"line one\nline two\n".repeat(50)).unwrap();

    let archive = work.path().join("notes.txt.gz");
    compress(&CompressRequest::new(&file, &archive, ArchiveType::Gzip).verify(true)).unwrap();
    assert_eq!(detect(&archive).unwrap(), ArchiveType::Gzip);

    let info = analyze(&archive, ArchiveType::Gzip).unwrap();
    assert_eq!(info.file_count, 1);
    assert_eq!(info.total_size, 900);

    let dest = work.path().join("out");
    extract(&ExtractRequest::new(&archive, &dest, ArchiveType::Gzip)).unwrap();
    assert_eq!(fs::read(dest.join("notes.txt")).unwrap(), fs::read(&file).unwrap());
}
