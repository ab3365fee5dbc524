use std::path::PathBuf;

pub fn setup_empty_test_folder(test_name: &str) -> PathBuf {
    let path = PathBuf::from("/tmp/oval-nav/gnss").join(test_name);
    if path.exists() {
        std::fs::remove_dir_all(&path).unwrap();
    }
    std::fs::create_dir_all(&path).unwrap();
    path
}
