//! The built-in default mod
//!
//! Sand, water, oil, plants, three stages of fire, steam and a handful of
//! sources that keep emitting their element into empty neighbors.

use crate::declarations::{Declarations, Statement, WhereClause};
use crate::element::PropertyKey::{Density, Gravity, Slide, Spread};

fn element(decls: &mut Declarations, name: &str, color: &str) {
    decls.push(Statement::element(name, color));
    decls.push(Statement::tag(name, "(all)"));
}

impl Declarations {
    /// Declarations of the default mod
    pub fn default_mod() -> Self {
        let mut d = Declarations::new();
        d.push(Statement::Title("Default Mod".to_string()));
        d.push(Statement::tag("Empty", "(all)"));

        d.push(Statement::relation("Solid", 1));
        d.push(Statement::where_block(
            vec![WhereClause::new("Solid", ["'x"])],
            vec![
                Statement::tag("'x", "Solids"),
                Statement::property(Density, "'x", 1.0),
                Statement::description("'x", "Solid. "),
            ],
        ));
        element(&mut d, "Wall", "#808080");
        d.push(Statement::member("Solid", ["Wall"]));

        d.push(Statement::relation("Dust", 1));
        d.push(Statement::where_block(
            vec![WhereClause::new("Dust", ["'x"])],
            vec![
                Statement::tag("'x", "Dusts"),
                Statement::property(Gravity, "'x", 1.0),
                Statement::property(Spread, "'x", 0.1),
                Statement::property(Density, "'x", 0.9),
                Statement::description("'x", "Falls. "),
            ],
        ));
        element(&mut d, "Sand", "#D8E090");
        d.push(Statement::member("Dust", ["Sand"]));

        d.push(Statement::relation("Liquid", 1));
        d.push(Statement::where_block(
            vec![WhereClause::new("Liquid", ["'x"])],
            vec![
                Statement::tag("'x", "Liquids"),
                Statement::property(Gravity, "'x", 1.0),
                Statement::property(Spread, "'x", 0.3),
                Statement::property(Slide, "'x", 1.0),
                Statement::property(Density, "'x", 0.8),
                Statement::description("'x", "Liquid. "),
            ],
        ));
        element(&mut d, "Water", "#0000FF");
        d.push(Statement::member("Liquid", ["Water"]));

        d.push(Statement::relation("Firey", 2));
        d.push(Statement::where_block(
            vec![WhereClause::new("Firey", ["'elem", "'extinguished"])],
            vec![Statement::description("'elem", "Burns. ")],
        ));

        element(&mut d, "Fire1", "#FFDF00");
        d.push(Statement::name("Fire1", "Fire"));
        d.push(Statement::member("Firey", ["Fire1", "Empty"]));
        d.push(Statement::property(Gravity, "Fire1", -0.0));
        d.push(Statement::property(Density, "Fire1", 0.5));
        d.push(Statement::element("Fire2", "#FF8000"));
        d.push(Statement::member("Firey", ["Fire2", "Empty"]));
        d.push(Statement::property(Gravity, "Fire2", -0.5));
        d.push(Statement::property(Density, "Fire2", 0.51));
        d.push(Statement::element("Fire3", "#FF0000"));
        d.push(Statement::member("Firey", ["Fire3", "Empty"]));
        d.push(Statement::property(Gravity, "Fire3", -1.0));
        d.push(Statement::property(Density, "Fire3", 0.52));
        d.push(Statement::self_transition(0.2, "Fire1", "Fire2"));
        d.push(Statement::self_transition(0.2, "Fire2", "Fire3"));
        d.push(Statement::self_transition(0.2, "Fire3", "Empty"));

        d.push(Statement::relation("Flammable", 1));
        d.push(Statement::where_block(
            vec![WhereClause::new("Flammable", ["'x"])],
            vec![
                Statement::tag("'x", "Flammables"),
                Statement::description("'x", "Flammable. "),
            ],
        ));
        d.push(Statement::where_block(
            vec![
                WhereClause::new("Flammable", ["'fuel"]),
                WhereClause::new("Firey", ["'fire", "'extinguished"]),
            ],
            vec![Statement::reaction(1.0, "'fuel", "'fire", "Fire1", "'fire")],
        ));

        element(&mut d, "Oil", "#804000");
        d.push(Statement::member("Liquid", ["Oil"]));
        d.push(Statement::property(Density, "Oil", 0.7));
        d.push(Statement::member("Flammable", ["Oil"]));

        element(&mut d, "Plant", "#008000");
        d.push(Statement::member("Solid", ["Plant"]));
        d.push(Statement::member("Flammable", ["Plant"]));
        d.push(Statement::reaction(1.0, "Water", "Plant", "Plant", "Plant"));

        d.push(Statement::relation("Source", 2));
        d.push(Statement::where_block(
            vec![WhereClause::new("Source", ["'source", "'elem"])],
            vec![
                Statement::tag("'source", "Sources"),
                Statement::member("Solid", ["'source"]),
                Statement::reaction(1.0, "'source", "Empty", "'source", "'elem"),
            ],
        ));

        element(&mut d, "Spring", "#000080");
        d.push(Statement::member("Source", ["Spring", "Water"]));
        element(&mut d, "Nature", "#808000");
        d.push(Statement::member("Source", ["Nature", "Plant"]));
        element(&mut d, "OilWell", "#603000");
        d.push(Statement::name("OilWell", "Oil Well"));
        d.push(Statement::member("Source", ["OilWell", "Oil"]));
        element(&mut d, "Torch", "#800000");
        d.push(Statement::member("Source", ["Torch", "Fire1"]));
        d.push(Statement::member("Firey", ["Torch", "Torch"]));
        element(&mut d, "Beach", "#FFFF00");
        d.push(Statement::member("Source", ["Beach", "Sand"]));

        d.push(Statement::relation("Gas", 1));
        d.push(Statement::where_block(
            vec![WhereClause::new("Gas", ["'x"])],
            vec![
                Statement::description("'x", "Gas. "),
                Statement::tag("'x", "Gasses"),
                Statement::property(Gravity, "'x", -1.0),
                Statement::property(Spread, "'x", 0.1),
                Statement::property(Density, "'x", -0.9),
                Statement::property(Slide, "'x", 1.0),
            ],
        ));
        d.push(Statement::element("Steam", "#E0E0E0"));
        d.push(Statement::member("Gas", ["Steam"]));
        d.push(Statement::self_transition(0.05, "Steam", "Water"));

        d.push(Statement::where_block(
            vec![WhereClause::new("Firey", ["'fire", "'extinguished"])],
            vec![
                Statement::reaction(0.1, "Water", "'fire", "Steam", "'fire"),
                Statement::reaction(0.4, "Water", "'fire", "Steam", "'extinguished"),
                Statement::reaction(0.5, "Water", "'fire", "Water", "'extinguished"),
            ],
        ));

        d
    }
}
