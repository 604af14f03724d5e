use std::io::{self, Write};

use super::config::{OutputConfig, OutputFormat};
use crate::activity::types::ActivityEnvelope;

pub trait Presenter: Send + Sync {
    fn emit(&self, env: &ActivityEnvelope, w: &mut dyn Write) -> io::Result<()>;
}

pub struct JsonPresenter { pub pretty: bool }
impl Presenter for JsonPresenter {
    fn emit(&self, env: &ActivityEnvelope, w: &mut dyn Write) -> io::Result<()> {
        if self.pretty { serde_json::to_writer_pretty(&mut *w, env).map_err(to_io)? } else { serde_json::to_writer(&mut *w, env).map_err(to_io)? }
        writeln!(w)
    }
}

pub struct TextPresenter;
impl Presenter for TextPresenter {
    fn emit(&self, env: &ActivityEnvelope, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "Fetched at: {}", env.fetched_at)?;
        match &env.data.github {
            Some(s) => {
                writeln!(w, "Repository: {}", s.repository.as_deref().unwrap_or("-"))?;
                writeln!(w, "Branch:     {}", s.branch.as_deref().unwrap_or("-"))?;
                // first line only; commit bodies can run long
                let message = s.message.as_deref().and_then(|m| m.lines().next()).unwrap_or("-");
                writeln!(w, "Message:    {}", message)?;
                writeln!(w, "Link:       {}", s.link.as_deref().unwrap_or("-"))?;
                writeln!(w, "Pushed at:  {}", s.occurred_at.as_deref().unwrap_or("-"))?;
            }
            None => writeln!(w, "No recent push activity.")?,
        }
        if let Some(errors) = &env.errors {
            for (source, msg) in errors { writeln!(w, "Error ({source}): {msg}")?; }
        }
        Ok(())
    }
}

pub struct Emitter {
    presenter: Box<dyn Presenter>,
}

impl Emitter {
    pub fn from_env(cfg: OutputConfig) -> Self {
        let presenter: Box<dyn Presenter> = match cfg.format {
            OutputFormat::Json => Box::new(JsonPresenter { pretty: cfg.pretty }),
            OutputFormat::Text => Box::new(TextPresenter),
        };
        Emitter { presenter }
    }

    pub fn emit(&self, env: &ActivityEnvelope) -> io::Result<()> {
        let mut out = io::stdout();
        self.presenter.emit(env, &mut out)?;
        out.flush()
    }
}

fn to_io(e: serde_json::Error) -> io::Error { io::Error::new(io::ErrorKind::Other, e) }
