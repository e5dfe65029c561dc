use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::CompileConfig;
use crate::error::CompilerError;

/// A single external-compiler command line, covering exactly one source
/// file. Built, executed, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    exe: String,
    args: Vec<String>,
    source: Utf8PathBuf,
}

impl Invocation {
    /// Assembles the argument vector in the order the compiler expects:
    /// output placement, generators, include dirs, switches, source file.
    pub(crate) fn assemble(config: &CompileConfig, source: &Utf8Path) -> Self {
        let mut args = Vec::new();

        args.push(if config.create_gen_folder { "-o" } else { "-out" }.to_string());
        args.push(config.output_dir.to_string());

        for generator in &config.generators {
            args.push("--gen".to_string());
            args.push(generator.to_arg());
        }

        for include in &config.includes {
            args.push("-I".to_string());
            args.push(include.to_string());
        }

        let switches = [
            (config.flags.recurse, "-r"),
            (config.flags.nowarn, "-nowarn"),
            (config.flags.strict, "-strict"),
            (config.flags.verbose, "-v"),
            (config.flags.debug, "-debug"),
        ];

        // Note: allow_neg_keys and allow_64bit_consts have no switch here.
        for (enabled, switch) in switches {
            if enabled {
                args.push(switch.to_string());
            }
        }

        args.push(source.to_string());

        Self {
            exe: config.executable.clone(),
            args,
            source: source.to_owned(),
        }
    }

    /// Runs the compiler and blocks until it exits, inheriting the current
    /// working directory and stdio. Any nonzero exit is an error.
    pub(crate) fn execute(&self) -> Result<(), CompilerError> {
        let status = Command::new(&self.exe)
            .args(&self.args)
            .status()
            .map_err(|source| CompilerError::Spawn {
                exe: self.exe.clone(),
                source,
            })?;

        if status.success() {
            return Ok(());
        }

        Err(CompilerError::Exit {
            file: self.source.clone(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Flags, Generator};

    fn config() -> CompileConfig {
        CompileConfig {
            executable: "thrift".into(),
            base_dir: "/project".into(),
            output_dir: "/out".into(),
            create_gen_folder: false,
            sources: vec![],
            includes: vec![Utf8PathBuf::from("/inc")],
            generators: vec![
                Generator::new("java", ""),
                Generator::new("html", "private-members"),
            ],
            flags: Flags {
                recurse: true,
                ..Flags::default()
            },
        }
    }

    #[test]
    fn test_assemble_argument_order() {
        let invocation = Invocation::assemble(&config(), Utf8Path::new("/src/a.thrift"));

        assert_eq!(invocation.exe, "thrift");
        assert_eq!(
            invocation.args,
            vec![
                "-out",
                "/out",
                "--gen",
                "java",
                "--gen",
                "html:private-members",
                "-I",
                "/inc",
                "-r",
                "/src/a.thrift",
            ],
        );
    }

    #[test]
    fn test_assemble_nested_gen_folder() {
        let config = CompileConfig {
            create_gen_folder: true,
            ..config()
        };

        let invocation = Invocation::assemble(&config, Utf8Path::new("/src/a.thrift"));
        assert_eq!(&invocation.args[..2], ["-o", "/out"]);
    }

    #[test]
    fn test_assemble_switch_order() {
        let config = CompileConfig {
            includes: vec![],
            generators: vec![],
            flags: Flags {
                recurse: true,
                nowarn: true,
                strict: true,
                verbose: true,
                debug: true,
                allow_neg_keys: true,
                allow_64bit_consts: true,
            },
            ..config()
        };

        let invocation = Invocation::assemble(&config, Utf8Path::new("/src/a.thrift"));
        assert_eq!(
            invocation.args,
            vec![
                "-out",
                "/out",
                "-r",
                "-nowarn",
                "-strict",
                "-v",
                "-debug",
                "/src/a.thrift",
            ],
        );
    }
}
