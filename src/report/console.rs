//! Presenters writing to a terminal or any other byte sink.

use std::io::{self, Write};

use super::{JsonReport, Presenter, RenderError, WarningView, format_report};

/// Prints the text report whenever the visible set changes.
pub struct ConsolePresenter<W: Write + Send> {
    out: W,
    max_rows: usize,
    last: Option<WarningView>,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout(max_rows: usize) -> Self {
        Self::new(io::stdout(), max_rows)
    }
}

impl<W: Write + Send> ConsolePresenter<W> {
    pub fn new(out: W, max_rows: usize) -> Self {
        Self {
            out,
            max_rows,
            last: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Presenter for ConsolePresenter<W> {
    fn render(&mut self, view: &WarningView) -> Result<(), RenderError> {
        if self.last.as_ref() == Some(view) {
            return Ok(());
        }
        self.out
            .write_all(format_report(view, self.max_rows).as_bytes())?;
        self.out.flush()?;
        self.last = Some(view.clone());
        Ok(())
    }

    fn close(&mut self) {
        if self.last.take().is_some() {
            let _ = writeln!(self.out, "No cover warnings to show.");
            let _ = self.out.flush();
        }
    }
}

/// Writes one JSON document per render.
pub struct JsonPresenter<W: Write + Send> {
    out: W,
}

impl JsonPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Presenter for JsonPresenter<W> {
    fn render(&mut self, view: &WarningView) -> Result<(), RenderError> {
        let json = JsonReport::from_view(view).to_json()?;
        writeln!(self.out, "{json}")?;
        self.out.flush()?;
        Ok(())
    }
}
