use anyhow::Result;
use async_trait::async_trait;
use std::io::{Stdin, Stdout, Write};

use crate::model::mapping::CostCenterCode;
use crate::model::worklog::{Account, Issue, Worklog};
use crate::util::console::{self, LineSource};

/// An account the mapping does not know yet, with the worklog that hit it.
pub struct ResolutionRequest<'a> {
    pub account: &'a Account,
    pub issue: &'a Issue,
    pub worklog: &'a Worklog,
}

/// Decides the work order of an unmapped account. `Ok(None)` defers the
/// account: its worklogs are skipped for this run.
#[async_trait]
pub trait AccountResolver: Send {
    async fn resolve(&mut self, request: &ResolutionRequest<'_>) -> Result<Option<CostCenterCode>>;
}

/// Never answers. Used for dry runs and non-interactive runs.
pub struct DeferringResolver;

#[async_trait]
impl AccountResolver for DeferringResolver {
    async fn resolve(&mut self, request: &ResolutionRequest<'_>) -> Result<Option<CostCenterCode>> {
        tracing::debug!(account = %request.account.id, "deferring unmapped account");
        Ok(None)
    }
}

/// Asks the operator for the work order.
pub struct PromptResolver<R, W> {
    /// Taken while a read runs on the blocking pool.
    input: Option<R>,
    output: W,
}

impl<R: LineSource, W: Write + Send> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Some(input),
            output,
        }
    }

    async fn answer(&mut self) -> Result<Option<String>> {
        let Some(input) = self.input.take() else {
            return Ok(None);
        };
        let (input, line) = console::read_line(input).await?;
        self.input = Some(input);
        Ok(line)
    }
}

impl PromptResolver<Stdin, Stdout> {
    /// Does not hold the stdin lock between prompts.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin(), std::io::stdout())
    }
}

#[async_trait]
impl<R: LineSource, W: Write + Send> AccountResolver for PromptResolver<R, W> {
    async fn resolve(&mut self, request: &ResolutionRequest<'_>) -> Result<Option<CostCenterCode>> {
        let out = &mut self.output;
        let summary: String = request.issue.summary.chars().take(60).collect();
        writeln!(out)?;
        writeln!(out, "  Unknown account: {} ({})", request.account.id, request.account.name)?;
        writeln!(out, "    Ticket:  {}", request.issue.key)?;
        writeln!(out, "    Summary: {summary}")?;
        writeln!(out, "    Worklog: {} {:.2}h", request.worklog.date, request.worklog.hours)?;
        write!(out, "  Enter work order (e.g., 1234-56789-001) or SKIP to skip: ")?;
        out.flush()?;

        let Some(line) = self.answer().await? else {
            return Ok(None);
        };
        let answer = line.trim();
        if answer.is_empty() || answer.eq_ignore_ascii_case("skip") {
            return Ok(None);
        }
        match CostCenterCode::parse(answer) {
            Ok(code) => {
                writeln!(self.output, "  [+] Saved mapping: {} -> {code}", request.account.id)?;
                Ok(Some(code))
            }
            Err(e) => {
                writeln!(self.output, "  [!] {e}")?;
                Ok(None)
            }
        }
    }
}
