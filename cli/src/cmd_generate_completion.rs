// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, io, path::Path};

use clap::{ArgMatches, Command, ValueEnum, arg, value_parser};
use clap_complete::generate;

use crate::Cli;

#[derive(Debug, Clone, Copy)]
pub struct CmdGenerateCompletion {
    pub shell: Option<Shell>,
}

impl CmdGenerateCompletion {
    pub const NAME: &str = "generate-completion";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Generate shell completion, for the current shell if none is given")
            .hide(true)
            .arg(
                arg!(shell: [SHELL] "The shell generator to use")
                    .value_parser(value_parser!(Shell)),
            )
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            shell: matches.get_one::<Shell>("shell").copied(),
        }
    }

    pub fn run(self) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "generating shell completion...");
        let shell = match self.shell {
            Some(shell) => shell,
            None => std::env::var_os("SHELL")
                .and_then(|path| Shell::from_path(Path::new(&path)))
                .ok_or("Cannot detect the current shell, please name one")?,
        };
        shell.generate(&mut io::stdout());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Elvish,
    Fish,
    Nushell,
    #[clap(name = "powershell")]
    #[allow(clippy::enum_variant_names)]
    PowerShell,
    Zsh,
}

impl Shell {
    /// Guess the shell from the file name of its executable.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_stem()?.to_str()?.to_ascii_lowercase();
        match name.as_str() {
            "bash" => Some(Self::Bash),
            "elvish" => Some(Self::Elvish),
            "fish" => Some(Self::Fish),
            "nu" | "nushell" => Some(Self::Nushell),
            "pwsh" | "powershell" => Some(Self::PowerShell),
            "zsh" => Some(Self::Zsh),
            _ => None,
        }
    }

    pub fn generate(self, buf: &mut impl io::Write) {
        use clap_complete::Shell as ClapShell;

        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        match self {
            Self::Bash => generate(ClapShell::Bash, &mut cmd, name, buf),
            Self::Elvish => generate(ClapShell::Elvish, &mut cmd, name, buf),
            Self::Fish => generate(ClapShell::Fish, &mut cmd, name, buf),
            Self::PowerShell => generate(ClapShell::PowerShell, &mut cmd, name, buf),
            Self::Zsh => generate(ClapShell::Zsh, &mut cmd, name, buf),
            Self::Nushell => generate(clap_complete_nushell::Nushell, &mut cmd, name, buf),
        }
    }
}
