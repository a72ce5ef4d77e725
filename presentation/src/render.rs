use application::pipeline::PipelineRun;
use application::response_stream::StreamEvent;
use colored::Colorize;
use domain::errors::PipelineError;
use std::io::{self, Write};

/// Writes the conversation to a terminal (or any writer) as it streams.
pub struct StreamRenderer<W: Write> {
    out: W,
}

impl<W: Write> StreamRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn user_message(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{} {}", "user:".cyan().bold(), text)?;
        writeln!(self.out)?;
        write!(self.out, "{} ", "assistant:".green().bold())?;
        self.out.flush()
    }

    pub fn fragment(&mut self, fragment: &str) -> io::Result<()> {
        write!(self.out, "{fragment}")?;
        self.out.flush()
    }

    pub fn done(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out)?;
        writeln!(self.out, "{}", "Done!".green().bold())?;
        writeln!(self.out, "{}", "Your symptoms have been analyzed!".green())?;
        self.out.flush()
    }

    /// Shown after the partial answer when the stream breaks.
    pub fn interrupted(&mut self, reason: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{}",
            format!("[response interrupted: {reason}]").red().bold()
        )?;
        self.out.flush()
    }

    pub fn failed(&mut self, err: &PipelineError) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{}",
            format!("Analysis failed while {}: {err}", err.stage()).red()
        )?;
        self.out.flush()
    }

    /// Drain `run` into the writer. Returns whether the run reached `Done`.
    pub async fn render_run(&mut self, run: &mut PipelineRun) -> io::Result<bool> {
        if let Some(err) = run.error() {
            self.failed(err)?;
            return Ok(false);
        }
        while let Some(event) = run.next_event().await {
            match event {
                StreamEvent::Fragment(fragment) => self.fragment(&fragment)?,
                StreamEvent::Done => {
                    self.done()?;
                    return Ok(true);
                }
                StreamEvent::Failed(reason) => {
                    self.interrupted(&reason)?;
                    return Ok(false);
                }
            }
        }
        Ok(false)
    }
}
