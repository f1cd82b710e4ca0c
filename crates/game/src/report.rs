//! Text summaries of a live saber for the headless driver.

use std::fmt;

use engine_core::Vec3;
use procgen::{MeshData, PartKind};
use rand::Rng;
use saber::{BladeState, SaberConfiguration, SaberInstance, Stage};

#[derive(Debug, Clone, PartialEq)]
pub struct PartReport {
    pub kind: PartKind,
    pub selection: &'static str,
    pub nodes: usize,
    pub position: Vec3,
    pub vertices: usize,
    pub triangles: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaberReport {
    pub parts: Vec<PartReport>,
    pub blade_state: BladeState,
    pub glowing_meshes: usize,
}

impl SaberReport {
    pub fn collect<R: Rng>(stage: &Stage<R>, saber: &SaberInstance, config: &SaberConfiguration) -> Self {
        let parts = PartKind::ALL
            .iter()
            .filter_map(|&kind| {
                let entity = saber.part(kind)?;
                let mesh = MeshData::from_scene(&stage.scene, entity);
                Some(PartReport {
                    kind,
                    selection: config.type_name(kind),
                    nodes: stage.scene.subtree(entity).len(),
                    position: saber.part_position(&stage.scene, kind).unwrap_or_default(),
                    vertices: mesh.vertex_count(),
                    triangles: mesh.triangle_count(),
                })
            })
            .collect();
        Self {
            parts,
            blade_state: saber.blade_state(),
            glowing_meshes: stage.scene.glow_layer().len(),
        }
    }

    pub fn total_vertices(&self) -> usize {
        self.parts.iter().map(|p| p.vertices).sum()
    }
}

impl fmt::Display for SaberReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            writeln!(
                f,
                "  {:<8} {:<10} nodes {:>2}  y {:>6.2}  verts {:>5}  tris {:>5}",
                part.kind.as_str(),
                part.selection,
                part.nodes,
                part.position.y,
                part.vertices,
                part.triangles
            )?;
        }
        write!(
            f,
            "  blade {:?}, {} glowing mesh(es), {} vertices total",
            self.blade_state,
            self.glowing_meshes,
            self.total_vertices()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Transform;
    use saber::BladeStart;

    #[test]
    fn report_lists_every_built_part() {
        let mut stage = Stage::new(3);
        let config = SaberConfiguration::create_default();
        let saber = SaberInstance::assemble(&mut stage, &config, Transform::default(), None, BladeStart::Extended);
        let report = SaberReport::collect(&stage, &saber, &config);

        assert_eq!(report.parts.len(), 4);
        assert_eq!(report.blade_state, BladeState::Extended);
        assert_eq!(report.glowing_meshes, 2);
        let blade = &report.parts[3];
        assert_eq!(blade.selection, "blue");
        assert_eq!(blade.position.y, 4.25);
        assert!(report.parts.iter().all(|p| p.vertices > 0 && p.nodes > 1));
        assert!(report.to_string().contains("emitter  standard"));

        let off = config.toggle_blade();
        let dark = SaberInstance::assemble(&mut stage, &off, Transform::default(), None, BladeStart::Extended);
        assert_eq!(SaberReport::collect(&stage, &dark, &off).parts.len(), 3);
    }
}
