use std::time::Instant;

use anyhow::Result;
use tracing::{info, info_span};

use xform_cli::pipeline::{BuildInputs, build_from_files, load_template, write_output_json};
use xform_model::{BuildOptions, FollowUpFallback};

use crate::cli::{BuildArgs, InspectArgs};
use crate::summary::print_prototypes;
use crate::types::BuildResult;

pub fn run_build(args: &BuildArgs) -> Result<BuildResult> {
    let start = Instant::now();
    let inputs = BuildInputs {
        template: args.template.clone(),
        spd: args.spd.clone(),
        safety: args.safety.clone(),
        performance: args.performance.clone(),
        harms: args.harms.clone(),
        follow_up: args.follow_up.clone(),
    };
    let options = build_options(args);

    let output = build_from_files(&inputs, &options)?;
    let written = if args.dry_run {
        info!("dry run; output not written");
        None
    } else {
        info_span!("write").in_scope(|| write_output_json(&args.out, &output.records))?;
        Some(args.out.clone())
    };
    info!(
        records = output.stats.records,
        duration_ms = start.elapsed().as_millis(),
        "build complete"
    );
    Ok(BuildResult {
        template: args.template.clone(),
        output: written,
        stats: output.stats,
    })
}

pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let index = load_template(&args.template)?;
    println!("Template: {}", args.template.display());
    if let Some(max_key) = index.max_key() {
        println!("Largest numeric key: {max_key}");
    }
    print_prototypes(&index.summary());
    Ok(())
}

fn build_options(args: &BuildArgs) -> BuildOptions {
    let fallback = if args.skip_unmatched_follow_up {
        FollowUpFallback::Skip
    } else {
        FollowUpFallback::Synthesize
    };
    BuildOptions::new()
        .with_zero_pad_spd_id(args.zero_pad_spd_id)
        .with_user(args.user.clone())
        .with_follow_up_fallback(fallback)
}
