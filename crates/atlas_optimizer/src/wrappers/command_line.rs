use std::{
    ffi::{OsStr, OsString},
    fmt::Display,
    path::Path,
    process::Command,
};

/// Solver command line. Options without a value are left out.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommandLine {
    arguments: Vec<OsString>,
}

impl CommandLine {
    pub fn flag(&mut self, name: &str, enabled: bool) -> &mut CommandLine {
        if enabled {
            self.arguments.push(OsString::from(name));
        }
        self
    }

    pub fn option(&mut self, name: &str, value: Option<impl Display>) -> &mut CommandLine {
        if let Some(value) = value {
            self.arguments.push(OsString::from(name));
            self.arguments.push(OsString::from(value.to_string()));
        }
        self
    }

    pub fn path(&mut self, name: &str, path: &Path) -> &mut CommandLine {
        self.arguments.push(OsString::from(name));
        self.arguments.push(path.as_os_str().to_owned());
        self
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.arguments
    }

    pub fn command(&self, program: impl AsRef<OsStr>) -> Command {
        let mut command = Command::new(program);
        command.args(&self.arguments);
        command
    }
}
