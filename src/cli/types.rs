use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;

use crate::cli::output;
use crate::collector::builtin;
use crate::compose;

/// Arguments for the `ccline types` subcommand.
#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct TypeInfo {
    name: &'static str,
    ttl_secs: u64,
    optional: bool,
}

#[derive(Debug, Serialize)]
struct FragmentInfo {
    name: String,
    inputs: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct Listing {
    content_types: Vec<TypeInfo>,
    fragments: Vec<FragmentInfo>,
}

fn listing() -> Listing {
    let content_types = builtin::collectors()
        .iter()
        .map(|c| TypeInfo {
            name: c.content_type().as_str(),
            ttl_secs: c.ttl().as_secs(),
            optional: c.optional(),
        })
        .collect();
    let fragments = compose::builtin::registry(&[])
        .iter()
        .map(|c| FragmentInfo {
            name: c.name().to_string(),
            inputs: c.input_types().iter().map(|t| t.as_str()).collect(),
        })
        .collect();
    Listing {
        content_types,
        fragments,
    }
}

pub fn run(args: Args) -> Result<()> {
    let listing = listing();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    output::header_stdout("Content types");
    for t in &listing.content_types {
        let ttl = if t.ttl_secs == 0 {
            "live".to_string()
        } else {
            format!("{}s", t.ttl_secs)
        };
        let kind = if t.optional { "optional" } else { "required" };
        println!("  {:<18} {:>5}  {}", t.name, ttl, kind);
    }
    println!();
    output::header_stdout("Fragments");
    for f in &listing.fragments {
        println!("  {:<18} {}", f.name, f.inputs.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_covers_types_and_fragments() {
        let listing = listing();
        assert_eq!(listing.content_types.len(), 18);
        let tokens = listing
            .fragments
            .iter()
            .find(|f| f.name == "tokens")
            .unwrap();
        assert_eq!(tokens.inputs, vec!["token-usage", "token-percent"]);
    }
}
