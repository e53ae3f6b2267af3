//! Equations sidebar and status bar for the Earth-Moon viewer

use egui::{Color32, Context, RichText};
use orbital_space::world::WorldStatus;

/// An equation with its name and formula
pub struct Equation {
    pub name: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
}

/// Draw the equations sidebar
pub fn draw_equations_sidebar(
    ctx: &Context,
    title: &str,
    equations: &[Equation],
    variables: &[(&str, &str)],
) {
    egui::SidePanel::right("equations_panel")
        .resizable(true)
        .default_width(300.0)
        .show(ctx, |ui| {
            ui.heading(RichText::new(title).color(Color32::LIGHT_BLUE));
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.collapsing(RichText::new("📐 Equations").strong(), |ui| {
                    for eq in equations {
                        ui.group(|ui| {
                            ui.label(RichText::new(eq.name).strong().color(Color32::YELLOW));
                            ui.label(RichText::new(eq.formula).monospace().color(Color32::WHITE));
                            ui.label(RichText::new(eq.description).small().italics());
                        });
                        ui.add_space(4.0);
                    }
                });

                ui.add_space(8.0);

                ui.collapsing(RichText::new("📖 Variables").strong(), |ui| {
                    egui::Grid::new("variables_grid")
                        .num_columns(2)
                        .spacing([10.0, 4.0])
                        .show(ui, |ui| {
                            for (symbol, meaning) in variables {
                                ui.label(RichText::new(*symbol).monospace().color(Color32::LIGHT_GREEN));
                                ui.label(*meaning);
                                ui.end_row();
                            }
                        });
                });
            });
        });
}

/// Top bar with the simulation date, speed and the followed target
pub fn draw_status_bar(ctx: &Context, status: &WorldStatus) {
    egui::TopBottomPanel::top("status_panel").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new(&status.date).monospace().color(Color32::WHITE));
            ui.separator();
            ui.label(format!("×{}", status.time_scale));
            if status.paused {
                ui.label(RichText::new("PAUSED").strong().color(Color32::YELLOW));
            }
            ui.separator();
            ui.label(format!("Method: {}", status.method));
            ui.separator();
            ui.label(format!("Target: {}", status.camera_target));
            ui.separator();
            match status.player_eccentricity {
                Some(e) => ui.label(format!("Player e = {:.4} ({})", e, status.player_soi)),
                None => ui.label(format!("Player e = n/a ({})", status.player_soi)),
            };
        });
    });
}

// ============================================================================
// Orbital Mechanics Equations
// ============================================================================

pub const ORBITAL_EQUATIONS: &[Equation] = &[
    Equation {
        name: "N-Body Acceleration",
        formula: "aᵢ = Σⱼ G·mⱼ·(rⱼ - rᵢ) / |rⱼ - rᵢ|³",
        description: "Every gravitating body pulls on every other body",
    },
    Equation {
        name: "Explicit Euler",
        formula: "x' = x + v·Δt,  v' = v + a(x)·Δt",
        description: "First order, drifts outward on orbits",
    },
    Equation {
        name: "Runge-Kutta 4",
        formula: "y' = y + Δt/6·(k₁ + 2k₂ + 2k₃ + k₄)",
        description: "Fourth order, all bodies advanced in one state vector",
    },
    Equation {
        name: "Vis-Viva",
        formula: "v² = μ·(2/r - 1/a)",
        description: "Speed anywhere on a Keplerian orbit",
    },
    Equation {
        name: "Eccentricity Vector",
        formula: "e = ((v² - μ/r)·r - (r·v)·v) / μ",
        description: "Points at periapsis; |e| sets the conic type",
    },
    Equation {
        name: "Orbit Conic",
        formula: "r(ν) = p / (1 + e·cos ν),  p = h²/μ",
        description: "Osculating orbit drawn for the Moon and ships",
    },
    Equation {
        name: "Kepler's Equation",
        formula: "M = E - e·sin E",
        description: "Solved by Newton iteration for the Sun direction",
    },
    Equation {
        name: "Sphere of Influence",
        formula: "r_SOI = a·(m / M)^(2/5)",
        description: "Region where the smaller body dominates",
    },
    Equation {
        name: "Hill Radius (L1, L2)",
        formula: "r_H ≈ a·(m / 3M)^(1/3)",
        description: "Distance of L1 and L2 from the secondary",
    },
    Equation {
        name: "Centre of Mass",
        formula: "R = Σ mᵢ·rᵢ / Σ mᵢ",
        description: "Earth-Moon barycentre",
    },
];

pub const ORBITAL_VARIABLES: &[(&str, &str)] = &[
    ("G", "Gravitational constant"),
    ("m, M", "Secondary / primary mass"),
    ("μ", "Standard gravitational parameter G·M"),
    ("r, v", "Relative position / velocity"),
    ("a", "Semi-major axis or separation"),
    ("e", "Eccentricity"),
    ("p", "Semi-latus rectum"),
    ("h", "Specific angular momentum |r × v|"),
    ("ν", "True anomaly"),
    ("E, M", "Eccentric / mean anomaly"),
    ("Δt", "Time step"),
];
