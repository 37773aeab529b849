//! Screen-space grid clustering for dense point layers
//!
//! Both the marker layer and the heat layer bucket projected points into a
//! uniform grid so a frame never paints tens of thousands of overlapping
//! primitives. Clustering happens in screen coordinates, after projection, so
//! the grouping follows the current zoom level for free.

use std::collections::HashMap;

/// One grid cell's aggregate: centroid position, member count, and the indices
/// of the source points that landed in the cell.
#[derive(Clone, Debug, PartialEq)]
pub struct GridCluster {
    pub x: f32,
    pub y: f32,
    pub count: usize,
    pub members: Vec<usize>,
}

/// Bucket screen-space points into `cell_size`-sized grid cells.
///
/// Each cluster's position is the mean of its members. Output order follows the
/// first appearance of each cell in the input, so results are deterministic.
pub fn cluster_points(points: &[(f32, f32)], cell_size: f32) -> Vec<GridCluster> {
    profiling::scope!("cluster_points");
    if cell_size <= 0.0 || !cell_size.is_finite() {
        return points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| GridCluster {
                x,
                y,
                count: 1,
                members: vec![i],
            })
            .collect();
    }

    let mut cell_order: Vec<(i32, i32)> = Vec::new();
    let mut cells: HashMap<(i32, i32), GridCluster> = HashMap::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        let key = (
            (x / cell_size).floor() as i32,
            (y / cell_size).floor() as i32,
        );
        match cells.get_mut(&key) {
            Some(cluster) => {
                cluster.x += x;
                cluster.y += y;
                cluster.count += 1;
                cluster.members.push(i);
            }
            None => {
                cell_order.push(key);
                cells.insert(
                    key,
                    GridCluster {
                        x,
                        y,
                        count: 1,
                        members: vec![i],
                    },
                );
            }
        }
    }

    cell_order
        .into_iter()
        .filter_map(|key| cells.remove(&key))
        .map(|mut cluster| {
            cluster.x /= cluster.count as f32;
            cluster.y /= cluster.count as f32;
            cluster
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clusters_nearby_points() {
        let points = vec![(10.0, 10.0), (12.0, 14.0), (200.0, 200.0)];
        let clusters = cluster_points(&points, 48.0);
        assert_eq!(clusters.len(), 2);

        let near = &clusters[0];
        assert_eq!(near.count, 2);
        assert_eq!(near.members, vec![0, 1]);
        assert!((near.x - 11.0).abs() < 1e-5);
        assert!((near.y - 12.0).abs() < 1e-5);

        assert_eq!(clusters[1].count, 1);
        assert_eq!(clusters[1].members, vec![2]);
    }

    #[test]
    fn test_empty_input() {
        assert!(cluster_points(&[], 48.0).is_empty());
    }

    #[test]
    fn test_zero_cell_size_leaves_points_unclustered() {
        let points = vec![(1.0, 1.0), (1.5, 1.5)];
        let clusters = cluster_points(&points, 0.0);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.count == 1));
    }

    #[test]
    fn test_negative_coordinates() {
        let points = vec![(-10.0, -10.0), (-12.0, -11.0), (10.0, 10.0)];
        let clusters = cluster_points(&points, 48.0);
        // Negative coordinates land in their own cell, not cell (0, 0)
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].count, 2);
    }
}
