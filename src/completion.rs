//! # Shell Completion Module
//!
//! Generates completion scripts for the `bairry` command through clap's
//! completion system.
//!
//! ```bash
//! # Generate bash completions
//! bairry completion bash > ~/.local/share/bash-completion/completions/bairry
//!
//! # Generate zsh completions
//! bairry completion zsh > ~/.config/zsh/completions/_bairry
//! ```

use crate::cli::Shell;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};

/// Map the CLI's shell choice onto clap_complete's.
#[must_use]
pub fn shell_to_completion_shell(shell: Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Write the completion script for `gen` into `out`.
pub fn write_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

/// Print the completion script for `gen` to stdout.
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    write_completions(gen, cmd, &mut io::stdout());
}
