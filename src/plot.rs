// src/plot.rs
// Static phase portraits of a finished trajectory, rendered with plotters into an RGB buffer and shipped as a PNG data URL.
// Three views: θ1 vs θ2 (points coloured by step index), θ vs ω for both links, and ω1 vs ω2.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use plotters::prelude::*;

use crate::error::{SimError, SimResult};
use crate::logic::Trajectory;

const W: u32 = 640;
const H: u32 = 520;

/// Which pair of state components to plot against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Theta1Theta2,
    ThetaOmega,
    Omega1Omega2,
}

impl FromStr for PlotKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "theta1-theta2" => Ok(PlotKind::Theta1Theta2),
            "theta-omega" => Ok(PlotKind::ThetaOmega),
            "omega1-omega2" => Ok(PlotKind::Omega1Omega2),
            _ => Err(SimError::InvalidArgument {
                what: "plot kind must be one of theta1-theta2, theta-omega, omega1-omega2",
            }),
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlotKind::Theta1Theta2 => "theta1-theta2",
            PlotKind::ThetaOmega => "theta-omega",
            PlotKind::Omega1Omega2 => "omega1-omega2",
        })
    }
}

fn plot_err(e: impl fmt::Display) -> SimError {
    SimError::Plot {
        message: e.to_string(),
    }
}

/// Axis range covering `values` with 5% padding on each side, or ±0.1 when the data is flat.
pub fn padded_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = if max != min { (max - min) * 0.05 } else { 0.1 };
    (min - pad, max + pad)
}

/// Renders `kind` for `trajectory` and returns a `data:image/png;base64,...` URL.
pub fn render_data_url(kind: PlotKind, trajectory: &Trajectory) -> SimResult<String> {
    let png = render_png(kind, trajectory)?;
    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(&png)
    ))
}

/// Renders `kind` for `trajectory` into PNG bytes.
pub fn render_png(kind: PlotKind, trajectory: &Trajectory) -> SimResult<Vec<u8>> {
    let mut pixel_buffer = vec![0u8; (W * H * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixel_buffer, (W, H)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;
        match kind {
            PlotKind::Theta1Theta2 => draw_theta1_theta2(&root, trajectory)?,
            PlotKind::ThetaOmega => draw_theta_omega(&root, trajectory)?,
            PlotKind::Omega1Omega2 => draw_omega1_omega2(&root, trajectory)?,
        }
        root.present().map_err(plot_err)?;
    }

    let img = image::RgbImage::from_raw(W, H, pixel_buffer)
        .ok_or_else(|| plot_err("pixel buffer does not match image size"))?;
    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut png, ImageFormat::Png)
        .map_err(plot_err)?;
    Ok(png.into_inner())
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

fn draw_theta1_theta2(root: &Area<'_>, trajectory: &Trajectory) -> SimResult<()> {
    let theta1 = trajectory.component(0);
    let theta2 = trajectory.component(1);
    let (x0, x1) = padded_range(&theta1);
    let (y0, y1) = padded_range(&theta2);

    let mut chart = ChartBuilder::on(root)
        .caption("Phase portrait: θ1 vs θ2", ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("θ1 (rad)")
        .y_desc("θ2 (rad)")
        .draw()
        .map_err(plot_err)?;

    // Hue sweeps from red towards violet as the integration step advances.
    let n = theta1.len().max(2) as f64 - 1.0;
    chart
        .draw_series(theta1.iter().zip(&theta2).enumerate().map(|(i, (&a, &b))| {
            Circle::new((a, b), 2, HSLColor(0.8 * i as f64 / n, 0.85, 0.45).filled())
        }))
        .map_err(plot_err)?;
    Ok(())
}

fn draw_theta_omega(root: &Area<'_>, trajectory: &Trajectory) -> SimResult<()> {
    let theta1 = trajectory.component(0);
    let theta2 = trajectory.component(1);
    let omega1 = trajectory.component(2);
    let omega2 = trajectory.component(3);
    let (x0, x1) = padded_range(theta1.iter().chain(&theta2));
    let (y0, y1) = padded_range(omega1.iter().chain(&omega2));

    let mut chart = ChartBuilder::on(root)
        .caption("Phase portrait: θ vs ω", ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("θ (rad)")
        .y_desc("ω (rad/s)")
        .draw()
        .map_err(plot_err)?;

    for (label, theta, omega, color) in [
        ("link 1", &theta1, &omega1, BLUE),
        ("link 2", &theta2, &omega2, RED),
    ] {
        chart
            .draw_series(LineSeries::new(
                theta.iter().zip(omega.iter()).map(|(&t, &w)| (t, w)),
                color.mix(0.8).stroke_width(1),
            ))
            .map_err(plot_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;
    Ok(())
}

fn draw_omega1_omega2(root: &Area<'_>, trajectory: &Trajectory) -> SimResult<()> {
    let omega1 = trajectory.component(2);
    let omega2 = trajectory.component(3);
    let (x0, x1) = padded_range(&omega1);
    let (y0, y1) = padded_range(&omega2);

    let mut chart = ChartBuilder::on(root)
        .caption("Phase portrait: ω1 vs ω2", ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("ω1 (rad/s)")
        .y_desc("ω2 (rad/s)")
        .draw()
        .map_err(plot_err)?;
    chart
        .draw_series(LineSeries::new(
            omega1.iter().zip(&omega2).map(|(&a, &b)| (a, b)),
            BLUE.mix(0.75).stroke_width(1),
        ))
        .map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_is_five_percent_of_span() {
        let (lo, hi) = padded_range(&[0.0, 2.0, 1.0]);
        assert!((lo + 0.1).abs() < 1e-12);
        assert!((hi - 2.1).abs() < 1e-12);
    }

    #[test]
    fn flat_data_gets_fixed_padding() {
        let (lo, hi) = padded_range(&[3.0, 3.0]);
        assert!((lo - 2.9).abs() < 1e-12 && (hi - 3.1).abs() < 1e-12);
        assert_eq!(padded_range(&Vec::<f64>::new()), (-1.0, 1.0));
    }

    #[test]
    fn plot_kinds_parse_from_route_names() {
        for kind in [PlotKind::Theta1Theta2, PlotKind::ThetaOmega, PlotKind::Omega1Omega2] {
            assert_eq!(kind.to_string().parse::<PlotKind>().unwrap(), kind);
        }
        assert!("theta".parse::<PlotKind>().is_err());
    }
}
