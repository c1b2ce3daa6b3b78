use anyhow::Context as _;
use clap::Parser;
use parsetab::{
    util::display_fn, Discipline, Error, Grammar, LALR1Parsing, LL1Parsing, LR0Parsing,
    LR1Parsing, LRParsing, Parsing, Render, SLR1Parsing,
};
use std::{path::PathBuf, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The parsing discipline to build the table for.
    #[arg(long, value_enum, default_value_t = Discipline::LALR1)]
    discipline: Discipline,

    /// Also print the LR automaton.
    #[arg(long)]
    automaton: bool,

    /// Print the grammar properties (nullable symbols, FIRST and FOLLOW sets).
    #[arg(long)]
    analysis: bool,

    /// The path of grammar definition file.
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    process_file(&args)
        .with_context(|| anyhow::anyhow!("errored during processing {}", args.input.display()))?;

    Ok(())
}

fn process_file(args: &Args) -> anyhow::Result<()> {
    let s = Instant::now();
    let grammar = Grammar::from_file(&args.input).context("failed to read the grammar")?;
    tracing::info!("parse_file: {:?} elapsed", s.elapsed());

    warn_suspicious(&grammar);
    if args.analysis {
        print_analysis(&grammar);
    }

    grammar
        .check_acyclic()
        .context("no parse table can be built")?;

    let discipline = args.discipline;
    let s = Instant::now();
    let verdict = match discipline {
        Discipline::LL1 => report(&LL1Parsing::new(&grammar)),
        Discipline::LR0 => report_lr(&LR0Parsing::new(&grammar), args.automaton),
        Discipline::SLR1 => report_lr(&SLR1Parsing::new(&grammar), args.automaton),
        Discipline::LR1 => report_lr(&LR1Parsing::new(&grammar), args.automaton),
        Discipline::LALR1 => report_lr(&LALR1Parsing::new(&grammar), args.automaton),
    };
    tracing::info!("compute_table: {:?} elapsed", s.elapsed());

    verdict.with_context(|| format!("the grammar is not {}", discipline))?;
    println!("The grammar is {}.", discipline);

    Ok(())
}

/// Print the table, then classify the grammar.
fn report<P: Parsing>(parsing: &P) -> Result<(), Error> {
    let table = parsing.table()?;
    println!("{}", display_fn(|f| table.render(parsing.grammar(), f)));
    parsing.classify()
}

fn report_lr<P: LRParsing>(parsing: &P, automaton: bool) -> Result<(), Error> {
    if automaton {
        let automaton = parsing.automaton()?;
        println!("{}", automaton.display(parsing.grammar()));
    }
    report(parsing)
}

fn warn_suspicious(grammar: &Grammar) {
    let unreachable = grammar.unreachable();
    if !unreachable.is_empty() {
        println!(
            "[warning] The following nonterminals are unreachable from the start symbol: {:?}",
            unreachable.iter().map(|t| t.as_str()).collect::<Vec<_>>()
        );
    }

    let unrealizable = grammar.unrealizable();
    if !unrealizable.is_empty() {
        println!(
            "[warning] The following nonterminals derive no terminal string: {:?}",
            unrealizable.iter().map(|t| t.as_str()).collect::<Vec<_>>()
        );
    }

    for production in grammar.null_ambiguity() {
        println!(
            "[warning] Ambiguous empty derivation: {}",
            grammar.production(production).display(grammar)
        );
    }
}

fn print_analysis(grammar: &Grammar) {
    println!("## productions");
    print!("{}", grammar);
    println!("## start: {}", grammar.start());
    println!("## nullable: {:?}", names(grammar.nullable()));
    println!("## first sets");
    for (nonterminal, first) in grammar.first_sets() {
        println!("- {}: {:?}", nonterminal, names(first));
    }
    println!("## follow sets");
    for (nonterminal, follow) in grammar.follow_sets() {
        println!("- {}: {:?}", nonterminal, names(follow));
    }
    println!();
}

fn names<'a>(tokens: impl IntoIterator<Item = &'a parsetab::Token>) -> Vec<&'a str> {
    tokens.into_iter().map(|t| t.as_str()).collect()
}
