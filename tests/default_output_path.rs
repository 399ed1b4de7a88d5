// Changes the process working directory, so it lives in its own test binary.
use std::env;
use std::fs;

use countprof::Profile;

#[test]
fn report_without_output_file_lands_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let previous = env::current_dir().unwrap();
    env::set_current_dir(dir.path()).unwrap();

    let result = Profile::new("unnamed_output").call(|| 21 * 2);
    env::set_current_dir(previous).unwrap();

    assert_eq!(result.unwrap(), 42);
    let text = fs::read_to_string(dir.path().join("unnamed_output.prof")).unwrap();
    assert!(text.contains("function calls"));
    assert!(text.contains("   Ordered by: cumulative time"));
    assert!(text.contains("(unnamed_output)"));
}
