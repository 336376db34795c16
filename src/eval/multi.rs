use sim_lib::config::{LevelConfig, SimConfig};
use sim_lib::memory::replacement::ReplacementPolicyKind;
use sim_lib::memory::InclusionPolicy;
use sim_lib::report::Report;
use sim_lib::run_wrapper::{fetch_operations, run_trace};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let param_tokens: Vec<String> = std::env::args().collect();
    let trace_path =
        param_tokens.get(1).ok_or("You should specify exactly one trace file")?;
    let trace_base_name = std::path::Path::new(trace_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| trace_path.clone());
    std::fs::create_dir_all("eval")?;
    let output_path = format!("eval/multi_eval_{}.csv", trace_base_name);

    let operations = fetch_operations(trace_path)?;

    let mut writer = csv::Writer::from_path(output_path)?;
    writer.write_record([
        "Inclusion",
        "Policy",
        "L1 miss rate",
        "L2 miss rate",
        "Memory traffic",
    ])?;

    // Single-level baseline, then every two-level combination
    for policy in ReplacementPolicyKind::ALL {
        let config = SimConfig::single_level(
            32,
            LevelConfig::make(1024, 2),
            policy,
        );
        let hierarchy = run_trace(&config, operations.clone())?;
        let report = Report::make(&config, trace_base_name.as_str(), &hierarchy);
        writer.write_record([
            "single-level".to_string(),
            policy.to_string(),
            format!("{:.6}", report.l1_miss_rate()),
            format!("{:.6}", report.l2_miss_rate()),
            report.memory_traffic().to_string(),
        ])?;
    }

    for inclusion in InclusionPolicy::ALL {
        for policy in ReplacementPolicyKind::ALL {
            let config = SimConfig::make(
                32,
                LevelConfig::make(1024, 2),
                LevelConfig::make(8192, 4),
                policy,
                inclusion,
            );
            let hierarchy = run_trace(&config, operations.clone())?;
            let report =
                Report::make(&config, trace_base_name.as_str(), &hierarchy);
            writer.write_record([
                inclusion.to_string(),
                policy.to_string(),
                format!("{:.6}", report.l1_miss_rate()),
                format!("{:.6}", report.l2_miss_rate()),
                report.memory_traffic().to_string(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}
