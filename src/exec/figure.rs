//! The plotting surface: accumulated draw commands, rendered to SVG on demand.
//!
//! Mirrors the "current figure" discipline: commands pile up until the
//! classifier drains them; `clear` must run after every render attempt.

use anyhow::{anyhow, bail, Result};

#[derive(Debug, Clone)]
pub enum PlotCmd {
    Hist { values: Vec<f64>, bins: usize },
    Bar { labels: Vec<String>, values: Vec<f64> },
    Line { xs: Vec<f64>, ys: Vec<f64> },
    Scatter { xs: Vec<f64>, ys: Vec<f64> },
}

#[derive(Debug)]
pub struct Figure {
    width: u32,
    height: u32,
    title: Option<String>,
    xlabel: Option<String>,
    ylabel: Option<String>,
    cmds: Vec<PlotCmd>,
}

impl Figure {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            title: None,
            xlabel: None,
            ylabel: None,
            cmds: Vec::new(),
        }
    }

    /// Labels alone are not drawn content (an empty figure with a title
    /// still classifies as "nothing plotted").
    pub fn has_content(&self) -> bool {
        !self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
        self.title = None;
        self.xlabel = None;
        self.ylabel = None;
    }

    pub fn push(&mut self, cmd: PlotCmd) {
        self.cmds.push(cmd);
    }

    pub fn set_title(&mut self, t: impl Into<String>) {
        self.title = Some(t.into());
    }

    pub fn set_xlabel(&mut self, t: impl Into<String>) {
        self.xlabel = Some(t.into());
    }

    pub fn set_ylabel(&mut self, t: impl Into<String>) {
        self.ylabel = Some(t.into());
    }

    /// Encode the current figure as SVG bytes. Does not clear; the caller
    /// owns the clear-after-classify step.
    pub fn render(&self) -> Result<Vec<u8>> {
        use plotters::prelude::*;

        if self.cmds.is_empty() {
            bail!("figure has no drawn content");
        }

        let ((x0, x1), (y0, y1)) = self.data_ranges();
        let bar_labels = self.bar_labels();

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| anyhow!("figure fill failed: {}", e))?;

            let mut builder = ChartBuilder::on(&root);
            builder.margin(10).x_label_area_size(40).y_label_area_size(50);
            if let Some(t) = &self.title {
                builder.caption(t, ("sans-serif", 24));
            }
            let mut chart = builder
                .build_cartesian_2d(x0..x1, y0..y1)
                .map_err(|e| anyhow!("chart build failed: {}", e))?;

            let label_fmt = |x: &f64| -> String {
                if let Some(labels) = &bar_labels {
                    let i = x.round();
                    if i >= 0.0 && (x - i).abs() < 1e-9 {
                        return labels.get(i as usize).cloned().unwrap_or_default();
                    }
                    return String::new();
                }
                format!("{}", x)
            };

            let mut mesh = chart.configure_mesh();
            mesh.x_label_formatter(&label_fmt);
            if let Some(l) = &self.xlabel {
                mesh.x_desc(l);
            }
            if let Some(l) = &self.ylabel {
                mesh.y_desc(l);
            }
            mesh.draw().map_err(|e| anyhow!("mesh draw failed: {}", e))?;

            for cmd in &self.cmds {
                match cmd {
                    PlotCmd::Hist { values, bins } => {
                        let buckets = histogram_bins(values, *bins);
                        chart
                            .draw_series(buckets.iter().map(|(lo, hi, count)| {
                                Rectangle::new(
                                    [(*lo, 0.0), (*hi, *count as f64)],
                                    BLUE.mix(0.5).filled(),
                                )
                            }))
                            .map_err(|e| anyhow!("histogram draw failed: {}", e))?;
                    }
                    PlotCmd::Bar { values, .. } => {
                        chart
                            .draw_series(values.iter().enumerate().map(|(i, v)| {
                                Rectangle::new(
                                    [(i as f64 - 0.4, 0.0), (i as f64 + 0.4, *v)],
                                    BLUE.mix(0.5).filled(),
                                )
                            }))
                            .map_err(|e| anyhow!("bar draw failed: {}", e))?;
                    }
                    PlotCmd::Line { xs, ys } => {
                        chart
                            .draw_series(LineSeries::new(
                                xs.iter().copied().zip(ys.iter().copied()),
                                &RED,
                            ))
                            .map_err(|e| anyhow!("line draw failed: {}", e))?;
                    }
                    PlotCmd::Scatter { xs, ys } => {
                        chart
                            .draw_series(
                                xs.iter()
                                    .copied()
                                    .zip(ys.iter().copied())
                                    .map(|pt| Circle::new(pt, 3, BLUE.filled())),
                            )
                            .map_err(|e| anyhow!("scatter draw failed: {}", e))?;
                    }
                }
            }

            root.present()
                .map_err(|e| anyhow!("figure present failed: {}", e))?;
        }

        Ok(svg.into_bytes())
    }

    fn bar_labels(&self) -> Option<Vec<String>> {
        self.cmds.iter().find_map(|c| match c {
            PlotCmd::Bar { labels, .. } => Some(labels.clone()),
            _ => None,
        })
    }

    fn data_ranges(&self) -> ((f64, f64), (f64, f64)) {
        let mut x = (f64::INFINITY, f64::NEG_INFINITY);
        let mut y = (f64::INFINITY, f64::NEG_INFINITY);
        let mut cover = |range: &mut (f64, f64), v: f64| {
            if v < range.0 {
                range.0 = v;
            }
            if v > range.1 {
                range.1 = v;
            }
        };

        for cmd in &self.cmds {
            match cmd {
                PlotCmd::Hist { values, bins } => {
                    for (lo, hi, count) in histogram_bins(values, *bins) {
                        cover(&mut x, lo);
                        cover(&mut x, hi);
                        cover(&mut y, 0.0);
                        cover(&mut y, count as f64);
                    }
                }
                PlotCmd::Bar { values, .. } => {
                    cover(&mut x, -0.5);
                    cover(&mut x, values.len() as f64 - 0.5);
                    cover(&mut y, 0.0);
                    for v in values {
                        cover(&mut y, *v);
                    }
                }
                PlotCmd::Line { xs, ys } | PlotCmd::Scatter { xs, ys } => {
                    for v in xs {
                        cover(&mut x, *v);
                    }
                    for v in ys {
                        cover(&mut y, *v);
                    }
                }
            }
        }

        (pad_range(x), pad_range(y))
    }
}

fn pad_range((lo, hi): (f64, f64)) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    (lo, hi)
}

fn histogram_bins(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() {
        return Vec::new();
    }
    let bins = bins.max(1);
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if (hi - lo).abs() < f64::EPSILON {
        1.0
    } else {
        (hi - lo) / bins as f64
    };

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (lo + i as f64 * width, lo + (i + 1) as f64 * width, c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hist_renders_non_empty_svg() {
        let mut fig = Figure::new(400, 300);
        fig.push(PlotCmd::Hist { values: vec![10.0, 20.0, 30.0], bins: 10 });
        let bytes = fig.render().unwrap();
        assert!(!bytes.is_empty());
        assert!(String::from_utf8(bytes).unwrap().contains("<svg"));
    }

    #[test]
    fn title_alone_is_not_content() {
        let mut fig = Figure::new(400, 300);
        fig.set_title("empty");
        assert!(!fig.has_content());
        assert!(fig.render().is_err());
    }

    #[test]
    fn clear_drops_commands_and_labels() {
        let mut fig = Figure::new(400, 300);
        fig.set_title("t");
        fig.push(PlotCmd::Scatter { xs: vec![1.0], ys: vec![2.0] });
        assert!(fig.has_content());
        fig.clear();
        assert!(!fig.has_content());
    }

    #[test]
    fn histogram_bins_cover_all_values() {
        let buckets = histogram_bins(&[1.0, 2.0, 3.0, 4.0], 2);
        let total: usize = buckets.iter().map(|(_, _, c)| c).sum();
        assert_eq!(total, 4);
        assert_eq!(buckets.len(), 2);
    }

    #[test]
    fn constant_values_still_bin() {
        let buckets = histogram_bins(&[5.0, 5.0, 5.0], 10);
        let total: usize = buckets.iter().map(|(_, _, c)| c).sum();
        assert_eq!(total, 3);
    }
}
