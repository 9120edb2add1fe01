//! Print a graph written by `export`.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::problems::print_problems;
use crate::graph::Severity;
use crate::graph::pretty::pretty_print_for;
use crate::resolver::ResolvedGraph;
use crate::serialization;

#[derive(Args, Debug)]
pub struct ShowCommand {
    /// Graph file written by `depgraph export`
    graph: PathBuf,

    /// Only show the dependencies of this module
    #[arg(short = 'm', long)]
    module: Option<String>,

    /// Print the graph's problems after the tree
    #[arg(long)]
    problems: bool,
}

impl ShowCommand {
    pub async fn execute(self) -> Result<()> {
        let graph = serialization::read_from_path(&self.graph)?;
        let resolved = ResolvedGraph::from_graph(graph);

        match &self.module {
            Some(module) => {
                let subgraph = resolved.module_deps(module)?;
                print!("{}", pretty_print_for(&subgraph.view(resolved.graph()), None));
            }
            None => print!("{}", resolved.pretty_print()),
        }

        if self.problems {
            println!();
            print_problems(&resolved.reported_problems(Severity::Warning));
        }
        Ok(())
    }
}
