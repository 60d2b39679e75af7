#[cfg(test)]
mod tests {
    use crate::community::{
        edge_betweenness_merges, leading_eigenvector_step, CommunityDetection, EdgeBetweenness,
        LeadingEigenvector, LeadingEigenvectorNaive,
    };
    use crate::eigen::{solve_symmetric, EigenOptions, Which};
    use crate::graph::adjacency::AdjacencyList;
    use crate::graph::{Direction, Graph, VertexSelector};
    use crate::metrics::modularity;
    use crate::motifs::Motifs;
    use crate::Result;
    use rand::prelude::*;

    fn two_triangles() -> Result<Graph> {
        Graph::from_edges(6, false, &[0, 1, 1, 2, 2, 0, 3, 4, 4, 5, 5, 3, 2, 3])
    }

    /// Zachary's karate club, 34 members and 78 friendships.
    fn karate() -> Result<Graph> {
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
        Graph::from_edges(34, false, &edges)
    }

    #[test]
    fn path_graph_loses_its_middle_edge_first() -> Result<()> {
        let g = Graph::from_edges(4, false, &[0, 1, 1, 2, 2, 3])?;
        let r = EdgeBetweenness::new().run(&g)?;
        assert_eq!(g.edge(r.removed[0])?, (1, 2));
        Ok(())
    }

    #[test]
    fn star_dissolves_into_singletons() -> Result<()> {
        let g = Graph::from_edges(5, false, &[0, 1, 0, 2, 0, 3, 0, 4])?;
        let r = EdgeBetweenness::new().run(&g)?;
        assert_eq!(r.betweenness[0], 4.0);
        assert!(r.betweenness.windows(2).all(|w| w[0] >= w[1]));

        let d = r.merges.ok_or(crate::Error::invalid("merges", "missing"))?;
        let (m, _) = d.to_membership(0)?;
        assert_eq!(m, vec![0, 1, 2, 3, 4]);
        let (m, _) = d.to_membership(d.len())?;
        assert_eq!(m, vec![0; 5]);
        Ok(())
    }

    #[test]
    fn complete_graph_is_not_split() -> Result<()> {
        let g = Graph::from_edges(4, false, &[0, 1, 0, 2, 0, 3, 1, 2, 1, 3, 2, 3])?;
        let r = LeadingEigenvector::new().with_steps(3).with_seed(42).run(&g)?;
        assert_eq!(r.membership, vec![0; 4]);
        Ok(())
    }

    #[test]
    fn detector_dendrograms_are_valid() -> Result<()> {
        let g = karate()?;
        let eb = EdgeBetweenness::new().run(&g)?;
        let d = eb.merges.ok_or(crate::Error::invalid("merges", "missing"))?;
        d.validate()?;
        assert_eq!(d.leaves(), 34);
        assert_eq!(d.len(), 33);
        let (m, sizes) = d.to_membership(d.len())?;
        assert!(m.iter().all(|&c| c == 0));
        assert_eq!(sizes, vec![34]);

        let (again, bridges) = edge_betweenness_merges(&g, &eb.removed)?;
        assert_eq!(again, d);
        assert_eq!(Some(bridges), eb.bridges);

        let le = LeadingEigenvector::new().with_seed(1).run(&g)?;
        le.merges.validate()?;
        assert_eq!(le.merges.leaves(), le.splits + 1);
        let (m, _) = le.merges.to_membership(le.merges.len())?;
        assert!(m.iter().all(|&c| c == 0));
        Ok(())
    }

    #[test]
    fn karate_club_partitions_score_well() -> Result<()> {
        let g = karate()?;
        let le = LeadingEigenvector::new().with_seed(7).detect(&g)?;
        let eb = EdgeBetweenness::new().detect(&g)?;
        let naive = LeadingEigenvectorNaive::new().with_seed(7).detect(&g)?;
        for membership in [&le, &eb] {
            assert_eq!(membership.len(), 34);
            assert!(modularity(&g, membership)? > 0.3);
        }
        // the naive variant keeps splitting sub-networks past the optimum
        assert!(modularity(&g, &naive)? > 0.1);
        // instructor and administrator end up apart
        assert_ne!(le[0], le[33]);
        assert_ne!(eb[0], eb[33]);
        Ok(())
    }

    #[test]
    fn power_iteration_agrees_with_lanczos() -> Result<()> {
        let g = two_triangles()?;
        let adj = AdjacencyList::new(&g, Direction::All)?;
        let degree: Vec<f64> = (0..6).map(|v| adj.neighbors(v).len() as f64).collect();
        let two_m = 2.0 * g.edge_count() as f64;

        // modularity matrix with the diagonal of k k^T / 2m left out
        let op = |y: &mut [f64], x: &[f64]| -> Result<()> {
            let ktx: f64 = x.iter().zip(&degree).map(|(a, k)| a * k).sum::<f64>() / two_m;
            for v in 0..6 {
                let ax: f64 = adj.neighbors(v).iter().map(|&u| x[u]).sum();
                y[v] = ax - ktx * degree[v] + degree[v] * degree[v] * x[v] / two_m;
            }
            Ok(())
        };
        let mut opts = EigenOptions::new(6)
            .with_nev(1)
            .with_ncv(4)
            .with_which(Which::LargestAlgebraic);
        let lanczos = solve_symmetric(op, &mut opts, None, None, false)?;

        let mut membership = vec![0; 6];
        let mut rng = StdRng::seed_from_u64(3);
        let step = leading_eigenvector_step(&g, &mut membership, 0, &mut rng)?;
        assert!(step.split);
        assert!((step.eigenvalue - lanczos.values[0]).abs() < 1e-6);
        assert_eq!(membership, vec![0, 0, 0, 1, 1, 1]);
        Ok(())
    }

    #[test]
    fn detectors_run_after_vertex_deletion() -> Result<()> {
        // drop the bridge endpoint 3; the rest splits into a triangle and a pair
        let mut g = two_triangles()?;
        g.delete_vertices(&VertexSelector::Single(3))?;
        assert_eq!(g.vertex_count(), 5);
        assert_eq!(g.edge_count(), 4);
        for v in 0..g.vertex_count() {
            assert_eq!(g.neighbors(v, Direction::All)?.len(), g.degree(v, Direction::All, true)?);
        }

        let eb = EdgeBetweenness::new().detect(&g)?;
        assert_eq!(eb[0], eb[1]);
        assert_eq!(eb[3], eb[4]);
        assert_ne!(eb[0], eb[3]);
        assert!((modularity(&g, &eb)? - modularity(&g, &[0, 0, 0, 1, 1])?).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn motif_census_counts_bridged_triangles() -> Result<()> {
        let g = two_triangles()?;
        // two triangles, plus paths through the bridge: 2-3 with one of
        // {0, 1} or one of {4, 5}
        assert_eq!(Motifs::new(3).census(&g)?, vec![0.0, 0.0, 4.0, 2.0]);
        Ok(())
    }
}
