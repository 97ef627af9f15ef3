use plotters::prelude::*;

/// Configuration options for chart generation
///
/// Covers the customizable properties shared by the dashboard and expenses
/// charts.
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Chart".to_string(),
            x_label: "X Axis".to_string(),
            y_label: "Y Axis".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Creates a line chart over labeled data points
///
/// Used by the dashboard to plot the CGPA of each semester. Points sit at
/// integer x positions and the tick labels are mapped back to the semester
/// labels.
///
/// # Arguments
/// * `labels` - Category labels in display order
/// * `values` - One value per label
/// * `options` - Chart styling options
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
///
/// # Implementation Notes
/// * The bitmap backend only draws to a path, so each render goes through a
///   uniquely named temp file; a fixed scratch name would let concurrent
///   chart requests clobber each other
pub fn line_chart(
    labels: &[String],
    values: &[f64],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let scratch = tempfile::Builder::new().suffix(".png").tempfile()?;
    {
        let root = BitMapBackend::new(scratch.path(), (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let max_y = values.iter().cloned().fold(0.0_f64, f64::max);
        let x_range = -0.5_f64..values.len() as f64 - 0.5;
        let y_range = 0.0_f64..max_y + 1.0;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|x| category_label(labels, *x))
            .draw()?;

        chart.draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
            &BLUE,
        ))?;
        chart.draw_series(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| Circle::new((i as f64, v), 4, BLUE.filled())),
        )?;

        root.present()?;
    }

    let buffer = std::fs::read(scratch.path())?;
    Ok(buffer)
}

/// Creates a bar chart over labeled data points
///
/// Used by the expenses page to compare total spend across semesters.
///
/// # Arguments
/// * `labels` - Category labels in display order
/// * `values` - One value per label
/// * `options` - Chart styling options
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
///
/// # Implementation Notes
/// * Bars are drawn 0.8 units wide (x-0.4 to x+0.4) with solid fill
pub fn bar_chart(
    labels: &[String],
    values: &[f64],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let scratch = tempfile::Builder::new().suffix(".png").tempfile()?;
    {
        let root = BitMapBackend::new(scratch.path(), (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let max_y = values.iter().cloned().fold(0.0_f64, f64::max);
        let x_range = -0.5_f64..values.len() as f64 - 0.5;
        let y_range = 0.0_f64..max_y + 1.0;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|x| category_label(labels, *x))
            .draw()?;

        chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
            Rectangle::new([(i as f64 - 0.4, 0.0), (i as f64 + 0.4, v)], BLUE.filled())
        }))?;

        root.present()?;
    }

    let buffer = std::fs::read(scratch.path())?;
    Ok(buffer)
}

/// Maps an axis position back to its category label; positions between
/// categories get an empty tick label.
fn category_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if idx >= 0.0 && (idx as usize) < labels.len() && (x - idx).abs() < 0.25 {
        labels[idx as usize].clone()
    } else {
        String::new()
    }
}
