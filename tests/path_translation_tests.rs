// Path translation property tests
use pylift::{translate_to_emulation, PathError, PyliftError};

fn assert_unrecognized(input: &str) {
    match translate_to_emulation(input) {
        Err(PyliftError::Path(inner)) => match *inner {
            PathError::UnrecognizedForm { path } => assert_eq!(path, input),
            other => panic!("expected UnrecognizedForm, got {other:?}"),
        },
        other => panic!("expected path error for {input:?}, got {other:?}"),
    }
}

#[test]
fn test_native_windows_paths_translate() {
    assert_eq!(translate_to_emulation(r"C:\a\b").unwrap(), "/c/a/b");
    assert_eq!(translate_to_emulation("C:/a/b").unwrap(), "/c/a/b");
    assert_eq!(
        translate_to_emulation(r"D:\Users\me\main.py").unwrap(),
        "/d/Users/me/main.py"
    );
}

#[test]
fn test_translation_is_idempotent() {
    let once = translate_to_emulation(r"E:\projects\tool").unwrap();
    let twice = translate_to_emulation(&once).unwrap();
    assert_eq!(once, twice);
    assert_eq!(twice, "/e/projects/tool");
}

#[test]
fn test_emulation_form_passes_through_with_lowered_drive() {
    assert_eq!(translate_to_emulation("/c/a/b").unwrap(), "/c/a/b");
    assert_eq!(translate_to_emulation("/C/a/b").unwrap(), "/c/a/b");
}

#[test]
fn test_mixed_separators_normalize() {
    assert_eq!(translate_to_emulation(r"C:/a\b/c").unwrap(), "/c/a/b/c");
}

#[test]
fn test_leading_separator_runs_collapse() {
    assert_eq!(translate_to_emulation(r"C:\\\a").unwrap(), "/c/a");
    assert_eq!(translate_to_emulation("/c///a/b").unwrap(), "/c/a/b");
}

#[test]
fn test_drive_roots() {
    assert_eq!(translate_to_emulation("C:").unwrap(), "/c");
    assert_eq!(translate_to_emulation(r"Z:\").unwrap(), "/z");
    assert_eq!(translate_to_emulation("/Z").unwrap(), "/z");
}

#[test]
fn test_unc_paths_are_never_passed_through() {
    assert_unrecognized(r"\\server\share");
    assert_unrecognized(r"\\?\C:\long\form");
}

#[test]
#[cfg(unix)]
fn test_posix_paths_are_rejected() {
    // Relative inputs are anchored to the working directory, which on a
    // POSIX host never yields a drive-letter form.
    assert_unrecognized("/usr/bin/python3");
    assert_unrecognized("scripts/run.py");
    assert_unrecognized("");
}
