use crate::{Credential, FunctionSecrets};
use log::warn;
use std::fmt;
use std::io::{self, Write};

/// An unpopulated field in a `listsecrets` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    UnpopulatedName,
    UnpopulatedKey,
}

impl Diagnostic {
    pub fn message(&self) -> &'static str {
        match self {
            Diagnostic::UnpopulatedName => "Due to spec issue #2 we see unpopulated Name properties",
            Diagnostic::UnpopulatedKey => "Due to spec issue #1 we end up here",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Checks `name` and `key` independently; either, both or neither may be reported.
pub fn diagnose(secrets: &FunctionSecrets) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if secrets.name().is_none() {
        diagnostics.push(Diagnostic::UnpopulatedName);
    }
    if secrets.key().is_none() {
        diagnostics.push(Diagnostic::UnpopulatedKey);
    }
    diagnostics
}

/// Writes the probe's plain-text report.
pub struct Reporter<W> {
    out: W,
    show_secrets: bool,
}

impl<W: Write> Reporter<W> {
    /// Tokens are redacted unless `show_secrets` is set.
    pub fn new(out: W, show_secrets: bool) -> Self {
        Self { out, show_secrets }
    }

    pub fn starting(&mut self) -> io::Result<()> {
        writeln!(self.out, "Starting")
    }

    pub fn header(&mut self, subscription_id: &str, credential: &Credential) -> io::Result<()> {
        let token = if self.show_secrets {
            credential.token().secret().to_owned()
        } else {
            credential.redacted()
        };
        writeln!(self.out, "Running with Sub: {}", subscription_id)?;
        writeln!(self.out, "Running with Token: {}", token)
    }

    pub fn report(&mut self, secrets: &FunctionSecrets) -> io::Result<Vec<Diagnostic>> {
        let diagnostics = diagnose(secrets);
        for diagnostic in &diagnostics {
            warn!("{:?}", diagnostic);
            writeln!(self.out, "{}", diagnostic)?;
        }
        Ok(diagnostics)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
