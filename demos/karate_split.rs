use modgraph::community::{CommunityDetection, EdgeBetweenness, LeadingEigenvector};
use modgraph::{modularity, Graph};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows the detectors' progress.
    env_logger::init();

    // Zachary's karate club: 34 members, 78 friendships.
    #[rustfmt::skip]
    let edges = [
        0, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0, 7, 0, 8, 0, 10, 0, 11, 0, 12, 0, 13,
        0, 17, 0, 19, 0, 21, 0, 31, 1, 2, 1, 3, 1, 7, 1, 13, 1, 17, 1, 19, 1, 21,
        1, 30, 2, 3, 2, 7, 2, 8, 2, 9, 2, 13, 2, 27, 2, 28, 2, 32, 3, 7, 3, 12,
        3, 13, 4, 6, 4, 10, 5, 6, 5, 10, 5, 16, 6, 16, 8, 30, 8, 32, 8, 33, 9, 33,
        13, 33, 14, 32, 14, 33, 15, 32, 15, 33, 18, 32, 18, 33, 19, 33, 20, 32,
        20, 33, 22, 32, 22, 33, 23, 25, 23, 27, 23, 29, 23, 32, 23, 33, 24, 25,
        24, 27, 24, 31, 25, 31, 26, 29, 26, 33, 27, 33, 28, 31, 28, 33, 29, 32,
        29, 33, 30, 32, 30, 33, 31, 32, 31, 33, 32, 33,
    ];
    let graph = Graph::from_edges(34, false, &edges)?;

    let le = LeadingEigenvector::new().with_seed(42).run(&graph)?;
    println!(
        "leading eigenvector: {} splits, Q = {:.4}",
        le.splits,
        modularity(&graph, &le.membership)?
    );

    let eb = EdgeBetweenness::new();
    let run = eb.run(&graph)?;
    println!(
        "edge betweenness: first removal is edge {:?} with betweenness {:.1}",
        graph.edge(run.removed[0])?,
        run.betweenness[0]
    );
    let labels = eb.detect(&graph)?;
    println!("edge betweenness at peak modularity: Q = {:.4}", modularity(&graph, &labels)?);

    // community id -> members
    let mut by_comm: std::collections::BTreeMap<usize, Vec<usize>> = std::collections::BTreeMap::new();
    for (v, c) in labels.iter().enumerate() {
        by_comm.entry(*c).or_default().push(v);
    }
    for (c, members) in &by_comm {
        println!("  community {c}: {members:?}");
    }

    Ok(())
}
