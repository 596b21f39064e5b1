use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

/// Every `.json` file under `folder_path`, sorted.
pub fn read_folder(folder_path: &Path) -> Result<Vec<PathBuf>, io::Error> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder_path)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(read_folder(&path)?);
        } else if path.extension().is_some_and(|extension| extension == "json") {
            files.push(path);
        }
    }

    files.sort();

    Ok(files)
}

/// The problem files named by `input`, a single file or a folder of them.
pub fn problem_files(input: &Path) -> Result<Vec<PathBuf>, io::Error> {
    if input.is_file() {
        Ok(vec![input.to_path_buf()])
    } else {
        read_folder(input)
    }
}

/// Writes `value` as pretty JSON, creating the parent folders.
pub fn write_json(path: &Path, value: &impl serde::Serialize) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_folder() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        for file in ["b.json", "a.json", "notes.txt", "nested/c.json"] {
            fs::write(dir.path().join(file), "{}").unwrap();
        }

        let files = read_folder(dir.path()).unwrap();

        assert_eq!(
            files,
            vec![
                dir.path().join("a.json"),
                dir.path().join("b.json"),
                dir.path().join("nested/c.json"),
            ]
        );
        assert_eq!(problem_files(&files[0]).unwrap(), vec![files[0].clone()]);
    }
}
