use clap::{App, Arg};
use std::fs::File;
use std::io::{stdin, stdout, BufWriter, Read};
use std::process::exit;
use tracing_subscriber::EnvFilter;

use hyperkbest::extract::{ExtractorConfig, KBestExtractor, LineWriter};
use hyperkbest::features::{DerivationCostFeature, FeatureFunction};
use hyperkbest::hypergraph::read_hypergraph;
use hyperkbest::vocabulary::Vocabulary;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = App::new("hyperkbest")
        .version("0.1")
        .about("Lazy k-best derivation extraction over weighted decoder hypergraphs")
        .arg(
            Arg::with_name("hypergraph")
                .index(1)
                .required(false)
                .help("Hypergraph file. Reads from stdin if not provided."),
        )
        .arg(
            Arg::with_name("k")
                .short("k")
                .takes_value(true)
                .help("Number of hypotheses to extract."),
        )
        .arg(
            Arg::with_name("sent")
                .short("s")
                .long("sent")
                .takes_value(true)
                .help("Sentence id to prefix every line with."),
        )
        .arg(
            Arg::with_name("unique")
                .short("u")
                .long("unique")
                .help("Deduplicate hypotheses by their surface string."),
        )
        .arg(
            Arg::with_name("tree")
                .short("t")
                .long("tree")
                .help("Emit labelled parse trees instead of flat yields."),
        )
        .arg(
            Arg::with_name("align")
                .short("a")
                .long("align")
                .help("Annotate tree labels with their spans.")
                .requires("tree"),
        )
        .arg(
            Arg::with_name("combined")
                .short("c")
                .long("combined")
                .help("Append the combined score to every line."),
        )
        .arg(
            Arg::with_name("monolingual")
                .short("m")
                .long("mono")
                .help("Read the source side of rules instead of the target side."),
        )
        .arg(
            Arg::with_name("models")
                .long("models")
                .help("Score with the stock derivation-cost model and print per-model scores."),
        )
        .arg(
            Arg::with_name("no-check")
                .long("no-check")
                .help("Skip the cost-reconstruction sanity check."),
        )
        .get_matches();

    let mut hypergraph_string = String::new();
    if let Some(path) = matches.value_of("hypergraph") {
        File::open(path)
            .expect("Could not open hypergraph file.")
            .read_to_string(&mut hypergraph_string)
            .expect("Could not read the provided hypergraph file.");
    } else {
        stdin()
            .read_to_string(&mut hypergraph_string)
            .expect("Could not read a hypergraph from stdin.");
    }

    let k: usize = match matches.value_of("k") {
        Some(n) => n.parse().expect("Invalid value for k."),
        None => 1,
    };
    let sent: Option<usize> = matches
        .value_of("sent")
        .map(|s| s.parse().expect("Invalid sentence id."));

    let mut vocab = Vocabulary::new();
    let hg = match read_hypergraph(&hypergraph_string, &mut vocab) {
        Ok(hg) => hg,
        Err(e) => {
            eprintln!("Could not read the hypergraph: {}", e);
            exit(1);
        }
    };

    let models: Vec<Box<dyn FeatureFunction>> = if matches.is_present("models") {
        vec![Box::new(DerivationCostFeature::new(1.0))]
    } else {
        Vec::new()
    };

    let config = ExtractorConfig {
        unique_nbest: matches.is_present("unique"),
        extract_tree: matches.is_present("tree"),
        include_alignment: matches.is_present("align"),
        add_combined_score: matches.is_present("combined"),
        monolingual: matches.is_present("monolingual"),
        sanity_check: !matches.is_present("no-check"),
    };

    let mut extractor = KBestExtractor::new(&mut vocab, config);
    let mut consumer = LineWriter::new(BufWriter::new(stdout()));
    if let Err(e) = extractor.extract(&hg, &models, k, sent, &mut consumer) {
        eprintln!("Extraction failed: {}", e);
        exit(1);
    }
}
