//! Fits each input string with its own shell over one shared backend.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use slidefit_core::{Begin, FitConfig, FitRequest, ResultCache};
use slidefit_shell::{frame_clock, FitShell, FixedWidth, Unmeasured};
use slidefit_text::{FontLoader, TextMeasurer};

/// Shape of every request the demo makes; only the text varies.
#[derive(Clone, Debug)]
pub struct Template {
    pub max_font_size: f32,
    pub min_font_size: f32,
    pub line_height: f32,
    pub max_lines: u32,
    pub font_family: String,
    pub width: Option<f32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FitReport {
    pub text: String,
    pub font_size: f32,
    pub cached: bool,
    pub oracle_calls: u64,
    /// Size after runtime fonts loaded, if they changed anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refit_size: Option<f32>,
}

pub async fn fit_all(
    texts: &[String],
    template: &Template,
    config: FitConfig,
    use_estimator: bool,
    fonts: &[PathBuf],
) -> Result<Vec<FitReport>, Box<dyn std::error::Error>> {
    let (oracle, estimator, loader) = slidefit_text::backend_with(TextMeasurer::new());
    let cache = ResultCache::new(config.cache_capacity);
    let mut clock = frame_clock(config.frame_interval_ms);

    let mut shells = Vec::with_capacity(texts.len());
    let mut reports = Vec::with_capacity(texts.len());
    for text in texts {
        let mut shell = FitShell::new(config.clone(), cache.clone())
            .with_oracle(oracle.clone())
            .with_font_events(loader.subscribe());
        shell = match template.width {
            Some(width) => shell.with_container(FixedWidth(width)),
            None => shell.with_container(Unmeasured),
        };
        if use_estimator {
            shell = shell.with_estimator(Arc::new(estimator.clone()));
        }

        let request = FitRequest::new(text.as_str(), template.min_font_size, template.max_font_size)
            .with_line_height(template.line_height)
            .with_max_lines(template.max_lines)
            .with_family(template.font_family.as_str());
        let begin = shell.start(request)?;
        // Give the estimate task a chance to land before the first step.
        tokio::task::yield_now().await;
        let font_size = shell.settle(&mut clock).await?;
        log::info!("[{}] {text:?} -> {font_size}px", shell.id());

        reports.push(FitReport {
            text: text.clone(),
            font_size,
            cached: matches!(begin, Begin::Cached(_)),
            oracle_calls: shell.controller().oracle_calls(),
            refit_size: None,
        });
        shells.push(shell);
    }

    if !fonts.is_empty() {
        load_fonts(&loader, fonts);
        for (shell, report) in shells.iter_mut().zip(reports.iter_mut()) {
            let size = shell.settle(&mut clock).await?;
            if size != report.font_size {
                report.refit_size = Some(size);
            }
        }
    }

    log::debug!("cache: {:?}", cache);
    Ok(reports)
}

fn load_fonts(loader: &FontLoader, fonts: &[PathBuf]) {
    for path in fonts {
        match loader.load_file(path) {
            Ok(event) => log::info!("loaded {} ({:?})", path.display(), event.families),
            Err(e) => log::error!("{e}"),
        }
    }
}
