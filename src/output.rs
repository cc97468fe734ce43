// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of search results as text, HTML or JSON

use anyhow::Result;
use colored::Colorize;
use minijinja::{context, Environment, Value};
use std::io::Write;

use crate::config::ConfigOutputFormat;
use crate::engine::pretty_timestamp;
use crate::video::VideoTimecodes;

const HEADER_TEMPLATE: &str = include_str!("../templates/header.html");
const VIDEO_TEMPLATE: &str = include_str!("../templates/video.html");
const NO_RESULTS_TEMPLATE: &str = include_str!("../templates/no_results.html");
const FOOTER_TEMPLATE: &str = include_str!("../templates/footer.html");

/// Page templates; the `.html` names turn on HTML auto-escaping.
fn html_templates() -> Result<Environment<'static>> {
    let mut templates = Environment::new();
    templates.add_template("header.html", HEADER_TEMPLATE)?;
    templates.add_template("video.html", VIDEO_TEMPLATE)?;
    templates.add_template("no_results.html", NO_RESULTS_TEMPLATE)?;
    templates.add_template("footer.html", FOOTER_TEMPLATE)?;
    Ok(templates)
}

/// Where rendered results go and how they look.
pub struct ResultWriter<W: Write> {
    out: W,
    format: ConfigOutputFormat,
    use_color: bool,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(out: W, format: ConfigOutputFormat) -> Self {
        Self {
            out,
            format,
            use_color: false,
        }
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.use_color = enabled;
        self
    }

    /// Render all results and return how many videos were written.
    ///
    /// Text and HTML are written as results arrive; JSON needs the full list.
    pub fn write_all<I>(mut self, query: &str, results: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<VideoTimecodes>>,
    {
        let count = match self.format {
            ConfigOutputFormat::Text => self.write_text(results)?,
            ConfigOutputFormat::Html => self.write_html(query, results)?,
            ConfigOutputFormat::Json => self.write_json(results)?,
        };
        self.out.flush()?;
        Ok(count)
    }

    fn write_text<I>(&mut self, results: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<VideoTimecodes>>,
    {
        let mut count = 0;
        for video in results {
            let video = video?;
            let heading = format!("{} {}", video.upload_date, video.title);
            if self.use_color {
                writeln!(self.out, "{}", heading.bold())?;
            } else {
                writeln!(self.out, "{}", heading)?;
            }
            for hit in &video.timecodes {
                let stamp = pretty_timestamp(hit.seconds);
                let context = hit.context.as_ref().map(|c| c.join(" ")).unwrap_or_default();
                if self.use_color {
                    writeln!(self.out, "    {} {} {}", stamp.green(), hit.url.cyan(), context)?;
                } else {
                    writeln!(self.out, "    {} {} {}", stamp, hit.url, context)?;
                }
            }
            count += 1;
        }
        Ok(count)
    }

    fn write_html<I>(&mut self, query: &str, results: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<VideoTimecodes>>,
    {
        let templates = html_templates()?;
        let header = templates
            .get_template("header.html")?
            .render(context! { query => query })?;
        writeln!(self.out, "{header}")?;

        let video_template = templates.get_template("video.html")?;
        let mut count = 0;
        for video in results {
            let video = video?;
            let hits: Vec<Value> = video
                .timecodes
                .iter()
                .map(|hit| {
                    context! {
                        url => hit.url,
                        stamp => pretty_timestamp(hit.seconds),
                        context => hit.context.as_ref().map(|c| c.join(" ")).unwrap_or_default()
                    }
                })
                .collect();
            let section = video_template.render(context! {
                upload_date => video.upload_date,
                title => video.title,
                hits => hits
            })?;
            writeln!(self.out, "{section}")?;
            count += 1;
        }

        if count == 0 {
            let empty = templates.get_template("no_results.html")?.render(context! {})?;
            writeln!(self.out, "{empty}")?;
        }
        let footer = templates.get_template("footer.html")?.render(context! {})?;
        writeln!(self.out, "{footer}")?;
        Ok(count)
    }

    fn write_json<I>(&mut self, results: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<VideoTimecodes>>,
    {
        let videos = results.into_iter().collect::<Result<Vec<_>>>()?;
        serde_json::to_writer_pretty(&mut self.out, &videos)?;
        writeln!(self.out)?;
        Ok(videos.len())
    }
}
