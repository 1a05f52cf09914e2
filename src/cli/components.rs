use std::error::Error;

use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use steampad::config::SessionConfig;
use steampad::drivers::steam_controller::component::{
    ComponentKind, ComponentSpec, ComponentTable, Identifier,
};

#[derive(Tabled)]
struct ComponentRow {
    index: usize,
    name: &'static str,
    kind: &'static str,
    description: String,
}

impl ComponentRow {
    fn new(index: usize, table: &ComponentTable, spec: &ComponentSpec) -> Self {
        let kind = match spec.kind {
            ComponentKind::Button { .. } | ComponentKind::PadButton { .. } => "Button",
            ComponentKind::DisabledButton => "Button (disabled)",
            ComponentKind::Axis { .. } => "Axis",
            ComponentKind::PairedAxis { .. } => "Paired axis",
        };
        let description = match (spec.id, spec.kind) {
            (Identifier::Button(button), _) => button.description().to_string(),
            (_, ComponentKind::PairedAxis { partner, zone, .. }) => {
                let partner = table.get(partner).map(|c| c.name()).unwrap_or_default();
                format!(
                    "Paired with {partner}, dead zone {}, edge zone {}",
                    zone.dead, zone.edge
                )
            }
            _ => String::new(),
        };

        Self {
            index,
            name: spec.name(),
            kind,
            description,
        }
    }
}

pub fn handle_components(config: &SessionConfig) -> Result<(), Box<dyn Error>> {
    let components = ComponentTable::new(config);
    let rows: Vec<ComponentRow> = components
        .components()
        .iter()
        .enumerate()
        .map(|(index, spec)| ComponentRow::new(index, &components, spec))
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Components"));
    println!("{table}");
    println!(
        "{} button(s), {} axis/axes",
        components.buttons().count(),
        components.len() - components.buttons().count()
    );

    Ok(())
}
