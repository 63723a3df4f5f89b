use super::traits::{DumpFilter, DumpRequest, FilterError, LoadFilter, LoadedScene, ParseErrorKind};
use crate::core::kinds::elements;
use crate::core::kinds::mixins::{NAME, TRANSFORMATION};
use crate::core::kinds::molecular::{ATOM, FOLDER, NUMBER, UNIVERSE};
use crate::core::models::kind::KindCatalog;
use crate::core::models::tree::SceneTree;
use crate::core::models::value::PropertyValue;
use nalgebra::{Isometry3, Vector3};
use std::io::{BufRead, Write};
use tracing::debug;

const DEFAULT_TITLE: &str = "Generated by zeo";

/// Plain XYZ: an atom count, a title line, then one `symbol x y z` line per atom.
///
/// Loading puts every atom directly under the universe and uses the title as
/// the universe name. Dumping writes absolute positions of all atoms found in
/// the requested subtrees.
#[derive(Debug, Default, Clone, Copy)]
pub struct XyzFilter;

fn parse_float(token: &str, line: usize) -> Result<f64, FilterError> {
    token.parse().map_err(|_| FilterError::Parse {
        line,
        kind: ParseErrorKind::InvalidFloat(token.to_string()),
    })
}

impl LoadFilter for XyzFilter {
    fn name(&self) -> &str {
        "xyz"
    }

    fn description(&self) -> &str {
        "XYZ coordinate file"
    }

    fn load(
        &self,
        reader: &mut dyn BufRead,
        kinds: &KindCatalog,
    ) -> Result<LoadedScene, FilterError> {
        let universe_kind = kinds.get(UNIVERSE)?;
        let folder_kind = kinds.get(FOLDER)?;
        let atom_kind = kinds.get(ATOM)?;

        let mut tree = SceneTree::new();
        let universe = tree.create(universe_kind);
        let folder = tree.create(folder_kind);

        let mut lines = reader.lines();
        let count_line = lines.next().transpose()?.unwrap_or_default();
        let count_token = count_line.trim();
        let expected: usize = count_token.parse().map_err(|_| FilterError::Parse {
            line: 1,
            kind: ParseErrorKind::InvalidInt(count_token.to_string()),
        })?;
        let title = lines.next().transpose()?.ok_or(FilterError::Parse {
            line: 2,
            kind: ParseErrorKind::Truncated { expected, found: 0 },
        })?;
        let title = title.trim();
        if !title.is_empty() {
            tree.set_property(universe, NAME, PropertyValue::Text(title.to_string()))?;
        }

        let mut found = 0;
        while found < expected {
            let line_no = found + 3;
            let Some(line) = lines.next().transpose()? else {
                return Err(FilterError::Parse {
                    line: line_no,
                    kind: ParseErrorKind::Truncated { expected, found },
                });
            };
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(FilterError::Parse {
                    line: line_no,
                    kind: ParseErrorKind::MissingFields {
                        expected: 4,
                        found: fields.len(),
                    },
                });
            }
            let number = elements::atomic_number(fields[0]).ok_or_else(|| FilterError::Parse {
                line: line_no,
                kind: ParseErrorKind::UnknownElement(fields[0].to_string()),
            })?;
            let position = Vector3::new(
                parse_float(fields[1], line_no)?,
                parse_float(fields[2], line_no)?,
                parse_float(fields[3], line_no)?,
            );

            let atom = tree.create(atom_kind.clone());
            tree.set_property(atom, NAME, PropertyValue::Text(fields[0].to_string()))?;
            tree.set_property(atom, NUMBER, PropertyValue::Int(number))?;
            tree.set_property(
                atom,
                TRANSFORMATION,
                PropertyValue::Transform(Isometry3::translation(
                    position.x, position.y, position.z,
                )),
            )?;
            tree.attach_child(universe, atom, None)?;
            found += 1;
        }
        debug!(atoms = found, "Parsed XYZ stream");

        Ok(LoadedScene {
            tree,
            universe,
            folder,
        })
    }
}

impl DumpFilter for XyzFilter {
    fn name(&self) -> &str {
        "xyz"
    }

    fn description(&self) -> &str {
        "XYZ coordinate file"
    }

    fn dump(&self, writer: &mut dyn Write, request: &DumpRequest<'_>) -> Result<(), FilterError> {
        let tree = request.tree;
        let mut atoms = Vec::new();
        for root in request.roots() {
            for id in tree.subtree(root) {
                let Some(node) = tree.node(id) else { continue };
                if node.kind().name() != ATOM || atoms.contains(&id) {
                    continue;
                }
                atoms.push(id);
            }
        }

        let title = tree
            .node(request.universe)
            .and_then(|u| u.stored(NAME))
            .and_then(PropertyValue::as_text)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);

        writeln!(writer, "{}", atoms.len())?;
        writeln!(writer, "{}", title)?;
        for id in atoms {
            let number = tree
                .node(id)
                .and_then(|n| n.stored(NUMBER))
                .and_then(PropertyValue::as_int)
                .unwrap_or(0);
            let symbol = elements::symbol(number).ok_or_else(|| {
                FilterError::Unsupported(format!("atom with atomic number {}", number))
            })?;
            let p = tree.absolute_transform(id).translation.vector;
            writeln!(
                writer,
                "{:<3} {:>15.6} {:>15.6} {:>15.6}",
                symbol, p.x, p.y, p.z
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kinds::molecular::{FRAME, molecular_kinds};
    use std::io::Cursor;

    fn catalog() -> KindCatalog {
        let mut catalog = KindCatalog::new();
        for kind in molecular_kinds().unwrap() {
            catalog.insert(kind).unwrap();
        }
        catalog
    }

    const WATER: &str = "3\nwater\nO 0.0 0.0 0.0\nH 0.757 0.586 0.0\nH -0.757 0.586 0.0\n";

    fn load(text: &str) -> Result<LoadedScene, FilterError> {
        XyzFilter.load(&mut Cursor::new(text.as_bytes()), &catalog())
    }

    fn dump(scene: &LoadedScene, nodes: Option<&[crate::core::models::ids::NodeId]>) -> String {
        let mut out = Vec::new();
        XyzFilter
            .dump(
                &mut out,
                &DumpRequest {
                    tree: &scene.tree,
                    universe: scene.universe,
                    folder: scene.folder,
                    nodes,
                },
            )
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    mod reading {
        use super::*;

        #[test]
        fn loads_atoms_under_universe_in_order() {
            let scene = load(WATER).unwrap();
            let atoms = scene.tree.children_of(scene.universe).to_vec();
            assert_eq!(atoms.len(), 3);
            assert_eq!(
                scene.tree.get_property(atoms[0], NUMBER).unwrap(),
                PropertyValue::Int(8)
            );
            assert_eq!(
                scene.tree.get_property(scene.universe, NAME).unwrap(),
                PropertyValue::Text("water".into())
            );
            let p = scene.tree.absolute_transform(atoms[1]).translation.vector;
            assert!((p - Vector3::new(0.757, 0.586, 0.0)).norm() < 1e-12);
            assert!(scene.tree.children_of(scene.folder).is_empty());
        }

        #[test]
        fn rejects_bad_count() {
            let err = load("three\nx\n").unwrap_err();
            assert!(matches!(
                err,
                FilterError::Parse {
                    line: 1,
                    kind: ParseErrorKind::InvalidInt(_)
                }
            ));
        }

        #[test]
        fn rejects_truncated_stream() {
            let err = load("2\nshort\nO 0 0 0\n").unwrap_err();
            assert!(matches!(
                err,
                FilterError::Parse {
                    line: 4,
                    kind: ParseErrorKind::Truncated {
                        expected: 2,
                        found: 1
                    }
                }
            ));
        }

        #[test]
        fn rejects_unknown_element_and_bad_coordinates() {
            assert!(matches!(
                load("1\n\nQq 0 0 0\n").unwrap_err(),
                FilterError::Parse {
                    kind: ParseErrorKind::UnknownElement(_),
                    ..
                }
            ));
            assert!(matches!(
                load("1\n\nO 0 zero 0\n").unwrap_err(),
                FilterError::Parse {
                    kind: ParseErrorKind::InvalidFloat(_),
                    ..
                }
            ));
            assert!(matches!(
                load("1\n\nO 0 0\n").unwrap_err(),
                FilterError::Parse {
                    kind: ParseErrorKind::MissingFields { .. },
                    ..
                }
            ));
        }

        #[test]
        fn missing_kind_in_catalog_is_an_error() {
            let err = XyzFilter
                .load(&mut Cursor::new(WATER.as_bytes()), &KindCatalog::new())
                .unwrap_err();
            assert!(matches!(err, FilterError::Kind(_)));
        }
    }

    mod writing {
        use super::*;

        #[test]
        fn dump_writes_header_and_symbols() {
            let scene = load(WATER).unwrap();
            let text = dump(&scene, None);
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines[0], "3");
            assert_eq!(lines[1], "water");
            assert!(lines[2].starts_with("O "));
            assert!(lines[3].contains("0.757000"));
            assert_eq!(lines.len(), 5);
        }

        #[test]
        fn dump_composes_frame_transforms() {
            let mut scene = load("1\n\nSi 1.0 0.0 0.0\n").unwrap();
            let atom = scene.tree.children_of(scene.universe)[0];
            let frame = scene.tree.create(catalog().get(FRAME).unwrap());
            scene.tree.detach_child(scene.universe, atom).unwrap();
            scene.tree.attach_child(scene.universe, frame, None).unwrap();
            scene.tree.attach_child(frame, atom, None).unwrap();
            scene
                .tree
                .set_property(
                    frame,
                    TRANSFORMATION,
                    PropertyValue::Transform(Isometry3::translation(0.0, 2.0, 0.0)),
                )
                .unwrap();

            let text = dump(&scene, None);
            let fields: Vec<f64> = text
                .lines()
                .nth(2)
                .unwrap()
                .split_whitespace()
                .skip(1)
                .map(|t| t.parse().unwrap())
                .collect();
            assert_eq!(fields, vec![1.0, 2.0, 0.0]);
            assert_eq!(text.lines().nth(1), Some(DEFAULT_TITLE));
        }

        #[test]
        fn dump_subset_only_writes_selected_atoms() {
            let scene = load(WATER).unwrap();
            let first = scene.tree.children_of(scene.universe)[0];
            let text = dump(&scene, Some(&[first]));
            assert!(text.starts_with("1\n"));
        }
    }
}
