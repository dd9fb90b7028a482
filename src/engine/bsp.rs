// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSG (Constructive Solid Geometry) operations using BSP trees
//!
//! Both operands are turned into BSP trees whose polygons are clipped
//! against the other tree. Polygons straddling a splitting plane are cut in
//! two, so the output follows intersection curves exactly. Every output
//! polygon is emitted with its own vertices.

use super::{BooleanKernel, BooleanOp};
use crate::error::{EngineError, EngineResult};
use crate::geometry::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};

/// Distance under which a point counts as lying on a plane
const PLANE_EPSILON: f64 = 1e-5;

/// Binary space partition kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct BspKernel;

impl BspKernel {
    pub const NAME: &'static str = "bsp";

    pub fn new() -> Self {
        Self
    }
}

impl BooleanKernel for BspKernel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn compute(&self, a: &Mesh, b: &Mesh, op: BooleanOp) -> EngineResult<Mesh> {
        let polygons = match op {
            BooleanOp::Union => union(a, b)?,
            BooleanOp::Intersection => intersection(a, b)?,
            BooleanOp::Difference => difference(a, b)?,
            BooleanOp::SymmetricDifference => {
                let mut polygons = difference(a, b)?;
                polygons.extend(difference(b, a)?);
                polygons
            }
        };

        Ok(polygons_to_mesh(&polygons))
    }
}

#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

#[derive(Debug, Clone)]
struct Polygon {
    vertices: Vec<Point3<f64>>,
    plane: Plane,
}

/// BSP tree node for CSG operations
#[derive(Debug, Clone, Default)]
struct BspNode {
    plane: Option<Plane>,
    front: Option<usize>,
    back: Option<usize>,
    polygons: Vec<Polygon>,
    depth: usize,
}

/// BSP tree with nodes stored in an arena and walked with explicit stacks
///
/// Convex operands degenerate into a chain as deep as their polygon count,
/// so no operation recurses along the tree.
#[derive(Debug, Clone)]
struct BspTree {
    nodes: Vec<BspNode>,
}

const ROOT: usize = 0;

/// Where a point or polygon lies relative to a plane
const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

impl Plane {
    /// `None` for collinear points
    fn from_points(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a)).try_normalize(f64::EPSILON)?;
        let w = normal.dot(&a.coords);
        Some(Self { normal, w })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn classify_point(&self, point: &Point3<f64>) -> u8 {
        let distance = self.normal.dot(&point.coords) - self.w;
        if distance < -PLANE_EPSILON {
            BACK
        } else if distance > PLANE_EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Sort `polygon` into the four output lists, cutting it if it spans the plane
    fn split_polygon(
        &self,
        polygon: Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        let polygon_type = polygon
            .vertices
            .iter()
            .fold(COPLANAR, |acc, v| acc | self.classify_point(v));

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon);
                } else {
                    coplanar_back.push(polygon);
                }
            }
            FRONT => front.push(polygon),
            BACK => back.push(polygon),
            _ => {
                let types: Vec<u8> = polygon
                    .vertices
                    .iter()
                    .map(|v| self.classify_point(v))
                    .collect();
                let n = polygon.vertices.len();
                let mut f = Vec::with_capacity(n + 1);
                let mut b = Vec::with_capacity(n + 1);

                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (polygon.vertices[i], polygon.vertices[j]);

                    if ti != BACK {
                        f.push(vi);
                    }
                    if ti != FRONT {
                        b.push(vi);
                    }
                    if ti | tj == SPANNING {
                        let t = (self.w - self.normal.dot(&vi.coords))
                            / self.normal.dot(&(vj - vi));
                        let v = vi + (vj - vi) * t;
                        f.push(v);
                        b.push(v);
                    }
                }

                if f.len() >= 3 {
                    front.push(Polygon {
                        vertices: f,
                        plane: polygon.plane,
                    });
                }
                if b.len() >= 3 {
                    back.push(Polygon {
                        vertices: b,
                        plane: polygon.plane,
                    });
                }
            }
        }
    }
}

impl Polygon {
    fn from_triangle(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Option<Self> {
        let plane = Plane::from_points(&a, &b, &c)?;
        Some(Self {
            vertices: vec![a, b, c],
            plane,
        })
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }
}

impl BspTree {
    fn from_polygons(polygons: Vec<Polygon>) -> EngineResult<Self> {
        let mut tree = Self {
            nodes: vec![BspNode::default()],
        };
        tree.build(polygons)?;
        Ok(tree)
    }

    fn depth(&self) -> usize {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    /// Insert `polygons` into the tree
    ///
    /// A new node always keeps the polygon its plane was taken from, so a
    /// path grows by at most one node per inserted polygon. Going deeper
    /// means the planes no longer classify their own polygons as coplanar.
    fn build(&mut self, polygons: Vec<Polygon>) -> EngineResult<()> {
        let max_depth = self.depth() + polygons.len();
        let mut pending = vec![(ROOT, polygons)];

        while let Some((index, polygons)) = pending.pop() {
            let Some(first) = polygons.first() else {
                continue;
            };
            let node = &mut self.nodes[index];
            if node.depth > max_depth {
                return Err(EngineError::geometry(format!(
                    "BSP tree exceeded depth {max_depth} for {} polygons",
                    polygons.len()
                )));
            }
            let plane = *node.plane.get_or_insert(first.plane);

            let mut front = Vec::new();
            let mut back = Vec::new();
            let mut coplanar = Vec::new();
            for polygon in polygons {
                let mut coplanar_back = Vec::new();
                plane.split_polygon(polygon, &mut coplanar, &mut coplanar_back, &mut front, &mut back);
                coplanar.append(&mut coplanar_back);
            }
            node.polygons.append(&mut coplanar);

            if !front.is_empty() {
                pending.push((self.child(index, FRONT), front));
            }
            if !back.is_empty() {
                pending.push((self.child(index, BACK), back));
            }
        }
        Ok(())
    }

    /// Index of the front or back child of `index`, creating it if missing
    fn child(&mut self, index: usize, side: u8) -> usize {
        let existing = match side {
            FRONT => self.nodes[index].front,
            _ => self.nodes[index].back,
        };
        if let Some(child) = existing {
            return child;
        }

        let child = self.nodes.len();
        let depth = self.nodes[index].depth + 1;
        self.nodes.push(BspNode {
            depth,
            ..BspNode::default()
        });
        match side {
            FRONT => self.nodes[index].front = Some(child),
            _ => self.nodes[index].back = Some(child),
        }
        child
    }

    /// Convert solid space to empty space and empty space to solid space
    fn invert(&mut self) {
        for node in &mut self.nodes {
            for polygon in &mut node.polygons {
                polygon.flip();
            }
            if let Some(plane) = node.plane.as_mut() {
                plane.flip();
            }
            std::mem::swap(&mut node.front, &mut node.back);
        }
    }

    /// Remove the parts of `polygons` that are inside this tree
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let mut kept = Vec::new();
        let mut pending = vec![(ROOT, polygons)];

        while let Some((index, polygons)) = pending.pop() {
            if polygons.is_empty() {
                continue;
            }
            let node = &self.nodes[index];
            let Some(plane) = node.plane else {
                kept.extend(polygons);
                continue;
            };

            let mut front = Vec::new();
            let mut back = Vec::new();
            for polygon in polygons {
                let mut coplanar_front = Vec::new();
                let mut coplanar_back = Vec::new();
                plane.split_polygon(
                    polygon,
                    &mut coplanar_front,
                    &mut coplanar_back,
                    &mut front,
                    &mut back,
                );
                front.append(&mut coplanar_front);
                back.append(&mut coplanar_back);
            }

            match node.front {
                Some(child) => pending.push((child, front)),
                None => kept.extend(front),
            }
            // Polygons behind a leaf plane are inside the solid
            if let Some(child) = node.back {
                pending.push((child, back));
            }
        }

        kept
    }

    /// Remove the parts of this tree's polygons that are inside `other`
    fn clip_to(&mut self, other: &BspTree) {
        for node in &mut self.nodes {
            node.polygons = other.clip_polygons(std::mem::take(&mut node.polygons));
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        self.nodes
            .iter()
            .flat_map(|node| node.polygons.iter().cloned())
            .collect()
    }
}

/// Convert mesh to polygons, skipping zero-area triangles
fn mesh_to_polygons(mesh: &Mesh) -> Vec<Polygon> {
    mesh.triangles
        .iter()
        .filter_map(|tri| {
            let [i0, i1, i2] = tri.indices;
            Polygon::from_triangle(
                mesh.vertices[i0].position,
                mesh.vertices[i1].position,
                mesh.vertices[i2].position,
            )
        })
        .collect()
}

/// Fan-triangulate polygons back into a mesh
fn polygons_to_mesh(polygons: &[Polygon]) -> Mesh {
    let triangle_count: usize = polygons.iter().map(|p| p.vertices.len() - 2).sum();
    let mut mesh = Mesh::with_capacity(triangle_count * 3, triangle_count);

    for polygon in polygons {
        let first = polygon.vertices[0];
        for pair in polygon.vertices[1..].windows(2) {
            let v0 = mesh.add_vertex(Vertex::new(first));
            let v1 = mesh.add_vertex(Vertex::new(pair[0]));
            let v2 = mesh.add_vertex(Vertex::new(pair[1]));
            mesh.add_triangle(Triangle::new([v0, v1, v2]));
        }
    }

    mesh
}

fn trees(a: &Mesh, b: &Mesh) -> EngineResult<(BspTree, BspTree)> {
    Ok((
        BspTree::from_polygons(mesh_to_polygons(a))?,
        BspTree::from_polygons(mesh_to_polygons(b))?,
    ))
}

fn union(a: &Mesh, b: &Mesh) -> EngineResult<Vec<Polygon>> {
    let (mut a, mut b) = trees(a, b)?;
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons())?;
    Ok(a.all_polygons())
}

fn difference(a: &Mesh, b: &Mesh) -> EngineResult<Vec<Polygon>> {
    let (mut a, mut b) = trees(a, b)?;
    a.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons())?;
    a.invert();
    Ok(a.all_polygons())
}

fn intersection(a: &Mesh, b: &Mesh) -> EngineResult<Vec<Polygon>> {
    let (mut a, mut b) = trees(a, b)?;
    a.invert();
    b.clip_to(&a);
    b.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    a.build(b.all_polygons())?;
    a.invert();
    Ok(a.all_polygons())
}
