use std::path::PathBuf;

pub fn get_path(folder_name: &str) -> PathBuf {
    PathBuf::from(format!("/tmp/oval-nav/storage/{folder_name}"))
}

pub fn setup_empty_test_folder(folder_name: &str) -> PathBuf {
    let path = get_path(folder_name);
    if let Ok(true) = std::fs::exists(&path) {
        std::fs::remove_dir_all(&path)
            .unwrap_or_else(|_| panic!("Failed to cleanup test dir {}", path.display()));
    }
    std::fs::create_dir_all(&path).unwrap_or_else(|err| {
        panic!(
            "Failed to create test dir for {}. Reason: {err}",
            path.display()
        )
    });
    path
}
