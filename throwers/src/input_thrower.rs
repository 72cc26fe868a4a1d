use std::{
    io::{self, Write},
    sync::OnceLock,
};

use checkout::MAX_DARTS;
use itertools::Itertools;
use regex::Regex;
use types::{Dart, Progress, Thrower, TurnContext};

/// Asks a human at the terminal for each visit.
#[derive(Debug, Default)]
pub struct InputThrower {}

impl Thrower for InputThrower {
    fn throw_turn(&mut self, context: &TurnContext) -> Vec<Dart> {
        print_context(context);

        let mut buf = String::new();
        loop {
            match darts_from_stdin(&mut buf) {
                Ok(darts) => return darts,
                Err(err) => {
                    buf.clear();
                    log::error!("Error parsing darts from stdin: {err}")
                }
            }
        }
    }
}

fn print_context(context: &TurnContext) {
    println!(
        "{} ({}), round {}: {}",
        context.player, context.variant, context.turn_number, context.progress
    );
    for (opponent, progress) in context.opponents.iter() {
        println!("  {opponent}: {progress}");
    }
    if let Progress::Classic(_) = context.progress {
        if !context.checkout.is_empty() {
            println!(
                "Checkout: {}",
                context
                    .checkout
                    .iter()
                    .map(|darts| darts.iter().join(" "))
                    .join(" or ")
            );
        }
    }
}

fn darts_from_stdin(buf: &mut String) -> Result<Vec<Dart>, String> {
    print!("Your darts? (e.g. T20 S5 D16, or 'none') >> ");
    let _ = io::stdout().flush();
    match io::stdin().read_line(buf) {
        Ok(0) => Err("stdin closed".to_string()),
        Ok(_) => darts_from_str(buf),
        Err(err) => Err(format!("Error reading line from stdin: {err}")),
    }
}

fn muncher_regex() -> &'static Regex {
    static MUNCHER_RE: OnceLock<Regex> = OnceLock::new();
    MUNCHER_RE.get_or_init(|| {
        Regex::new(r"^(?<dart>[^,\s]+)(?:[,\s]\s*(?<tail>.*))?$").expect("Valid dart muncher regex")
    })
}

/// Parses up to three darts separated by commas or whitespace.
pub fn darts_from_str(input: &str) -> Result<Vec<Dart>, String> {
    let mut rest = input.trim();
    if rest.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }

    let mut darts = Vec::new();
    while let Some(caps) = muncher_regex().captures(rest) {
        log::debug!("Captured: {caps:?}");
        let token = caps.name("dart").map_or("", |m| m.as_str());
        let dart: Dart = token.parse().map_err(|e| format!("{e}"))?;
        darts.push(dart);
        rest = caps.name("tail").map_or("", |m| m.as_str().trim());
    }

    if darts.is_empty() {
        return Err(format!("No darts found in {input:?}"));
    }
    if darts.len() > MAX_DARTS {
        return Err(format!(
            "A visit is at most {MAX_DARTS} darts, got {}",
            darts.len()
        ));
    }
    Ok(darts)
}
