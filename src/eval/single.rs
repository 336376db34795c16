use sim_lib::config::{LevelConfig, SimConfig};
use sim_lib::memory::replacement::ReplacementPolicyKind;
use sim_lib::run_wrapper::{fetch_operations, run_trace};

const BLOCK_SIZE: u64 = 32;
const ASSOCIATIVITY: usize = 4;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let param_tokens: Vec<String> = std::env::args().collect();
    let trace_path =
        param_tokens.get(1).ok_or("You should specify exactly one trace file")?;
    let operations = fetch_operations(trace_path)?;

    // Plot line series for each replacement policy
    // For a fixed policy, vary the L1 size
    // Performance metric: L1 miss rate
    // Cache sizes: 1KB .. 64KB, as log2 of the size
    let size_bits: Vec<u32> = (10..=16).collect();

    // Propagate the data
    let policies = ReplacementPolicyKind::ALL;
    let mut data: Vec<Vec<(u32, f64)>> = vec![vec![]; policies.len()];
    let mut y_max: f64 = 0.;
    for (i, policy) in policies.iter().enumerate() {
        for bits in size_bits.iter() {
            let config = SimConfig::single_level(
                BLOCK_SIZE,
                LevelConfig::make(1 << bits, ASSOCIATIVITY),
                *policy,
            );
            let hierarchy = run_trace(&config, operations.clone())?;
            let miss_rate = hierarchy.l1().stats().get_miss_rate();
            log::info!("{} @ {}B: {:.6}", policy, 1u64 << bits, miss_rate);
            data[i].push((*bits, miss_rate));
            y_max = y_max.max(miss_rate);
        }
    }

    // Plot the data
    use plotters::prelude::*;

    let trace_base_name = std::path::Path::new(trace_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| trace_path.clone());
    let plot_title =
        format!("Single level evaluation (miss rate): {}", trace_base_name);
    std::fs::create_dir_all("eval")?;
    let output_path = format!("eval/single_eval_{}.svg", trace_base_name);

    let root =
        SVGBackend::new(output_path.as_str(), (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(plot_title.as_str(), ("sans-serif", 40).into_font())
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(10u32..16u32, 0.0..(y_max * 1.1).max(0.01))?;
    ctx.configure_mesh()
        .x_desc("L1 size")
        .y_desc("Miss rate")
        .x_label_formatter(&|bits| format!("{}KB", 1u64 << (bits - 10)))
        .draw()?;

    for (i, policy) in policies.iter().enumerate() {
        let series = data[i].iter().copied();
        let label = format!("{}", policy);
        let color = Palette99::pick(i).to_rgba();
        ctx.draw_series(LineSeries::new(series, color))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color)
            });
    }

    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;

    Ok(())
}
