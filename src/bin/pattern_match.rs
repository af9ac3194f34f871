use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use zkp_pattern_match::{
    expansion::{ensure_expanded, expansion_size},
    utils::field_to_hex,
    Alphabet, Config, ExpandedCommitment, MatchProver, PatternCommitment,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Protocol {
    /// Membership in the expanded pattern universe
    A,
    /// In-circuit matching at a private offset
    B,
    Both,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Comma-separated patterns; the wildcard matches any single symbol
    #[arg(short, long, value_delimiter = ',', required = true)]
    patterns: Vec<String>,

    #[arg(short, long)]
    client: String,

    #[arg(long, value_enum, default_value_t = Protocol::Both)]
    protocol: Protocol,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the in-circuit proof as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run_expansion(config: &Config, alphabet: &Alphabet, patterns: &[&str], client: &str) -> Result<()> {
    if let Some(size) = expansion_size(patterns, client.len(), alphabet) {
        println!("Expanded universe size: {size}");
    }

    let commitment =
        ExpandedCommitment::build(patterns, client.len(), alphabet, config.expansion.max_leaves)
            .context("Failed to commit to the expanded patterns")?;
    println!("Expanded root: {}", field_to_hex(commitment.root()));

    let proof = commitment
        .prove(client)
        .context("Client string is not in the expanded universe")?;
    debug!("{proof}");

    ensure_expanded(
        alphabet,
        commitment.root(),
        client,
        &proof,
        commitment.leaf_count(),
    )
    .context("Expansion proof was rejected")?;

    println!("✓ Expansion proof verified");
    Ok(())
}

fn run_circuit(
    config: &Config,
    alphabet: &Alphabet,
    patterns: &[&str],
    client: &str,
    output: Option<&PathBuf>,
) -> Result<()> {
    let commitment = PatternCommitment::build(patterns, alphabet)
        .context("Failed to commit to the patterns")?;
    println!("Pattern root: {}", field_to_hex(commitment.root()));

    let prover = MatchProver::with_k_bounds(
        alphabet.clone(),
        config.circuit.min_k,
        config.circuit.max_k,
    );

    println!("Generating ZK proof (this may take a while)...");
    let proof = prover
        .prove(&commitment, client)
        .context("Failed to create match proof")?;
    println!("ZK proof generated, size: {} bytes", proof.zkp_proof.len());

    proof.validate().context("Proof output is malformed")?;
    prover
        .ensure_verified(&proof)
        .context("Match proof was rejected")?;
    println!("✓ Match proof verified");

    if let Some(path) = output {
        info!("Writing proof to: {}", path.display());
        let json = serde_json::to_string_pretty(&proof).context("Failed to serialize proof to JSON")?;
        fs::write(path, json).context("Failed to write proof file")?;
        println!("Proof saved to {}", path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    let alphabet = config.alphabet()?;

    let patterns: Vec<&str> = args.patterns.iter().map(|p| p.trim()).collect();
    alphabet
        .validate_client_string(&args.client)
        .context("Invalid client string")?;

    info!(
        "Matching a client string of length {} against {} patterns",
        args.client.len(),
        patterns.len()
    );

    if matches!(args.protocol, Protocol::A | Protocol::Both) {
        run_expansion(&config, &alphabet, &patterns, &args.client)?;
    }
    if matches!(args.protocol, Protocol::B | Protocol::Both) {
        run_circuit(
            &config,
            &alphabet,
            &patterns,
            &args.client,
            args.output.as_ref(),
        )?;
    }

    Ok(())
}
