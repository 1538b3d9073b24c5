// src/categories/taxonomy.rs
//! Static category taxonomy
//!
//! Groups are presentation data layered over the flat `categories` table.
//! A category whose slug appears in no group lands in the "Outros" bucket.

use super::models::{Category, CategoryGroup};

pub struct GroupDefinition {
    pub slug: &'static str,
    pub name: &'static str,
    pub members: &'static [&'static str],
}

pub const OTHER_GROUP_SLUG: &str = "outros";
pub const OTHER_GROUP_NAME: &str = "Outros";

pub const CATEGORY_GROUPS: &[GroupDefinition] = &[
    GroupDefinition {
        slug: "reformas-e-construcao",
        name: "Reformas e Construção",
        members: &[
            "pedreiro",
            "pintor",
            "eletricista",
            "encanador",
            "gesseiro",
            "azulejista",
            "serralheiro",
            "vidraceiro",
            "marceneiro",
        ],
    },
    GroupDefinition {
        slug: "casa-e-limpeza",
        name: "Casa e Limpeza",
        members: &[
            "diarista",
            "passadeira",
            "jardineiro",
            "piscineiro",
            "dedetizador",
            "montador-de-moveis",
            "chaveiro",
        ],
    },
    GroupDefinition {
        slug: "tecnologia-e-manutencao",
        name: "Tecnologia e Manutenção",
        members: &[
            "tecnico-de-informatica",
            "tecnico-de-celular",
            "tecnico-de-ar-condicionado",
            "tecnico-de-eletrodomesticos",
            "instalador-de-cameras",
        ],
    },
    GroupDefinition {
        slug: "beleza-e-bem-estar",
        name: "Beleza e Bem-estar",
        members: &["cabeleireiro", "manicure", "maquiador", "barbeiro", "massagista"],
    },
    GroupDefinition {
        slug: "aulas-e-eventos",
        name: "Aulas e Eventos",
        members: &["professor-particular", "fotografo", "cozinheiro", "garcom"],
    },
];

/// Categories inserted by the migration, as (slug, name)
pub const SEED_CATEGORIES: &[(&str, &str)] = &[
    ("pedreiro", "Pedreiro"),
    ("pintor", "Pintor"),
    ("eletricista", "Eletricista"),
    ("encanador", "Encanador"),
    ("gesseiro", "Gesseiro"),
    ("azulejista", "Azulejista"),
    ("serralheiro", "Serralheiro"),
    ("vidraceiro", "Vidraceiro"),
    ("marceneiro", "Marceneiro"),
    ("diarista", "Diarista"),
    ("passadeira", "Passadeira"),
    ("jardineiro", "Jardineiro"),
    ("piscineiro", "Piscineiro"),
    ("dedetizador", "Dedetizador"),
    ("montador-de-moveis", "Montador de Móveis"),
    ("chaveiro", "Chaveiro"),
    ("tecnico-de-informatica", "Técnico de Informática"),
    ("tecnico-de-celular", "Técnico de Celular"),
    ("tecnico-de-ar-condicionado", "Técnico de Ar-condicionado"),
    ("tecnico-de-eletrodomesticos", "Técnico de Eletrodomésticos"),
    ("instalador-de-cameras", "Instalador de Câmeras"),
    ("cabeleireiro", "Cabeleireiro"),
    ("manicure", "Manicure"),
    ("maquiador", "Maquiador"),
    ("barbeiro", "Barbeiro"),
    ("massagista", "Massagista"),
    ("professor-particular", "Professor Particular"),
    ("fotografo", "Fotógrafo"),
    ("cozinheiro", "Cozinheiro"),
    ("garcom", "Garçom"),
    ("motorista", "Motorista"),
    ("fretes-e-mudancas", "Fretes e Mudanças"),
    ("costureira", "Costureira"),
    ("cuidador-de-idosos", "Cuidador de Idosos"),
    ("baba", "Babá"),
];

/// Slug of the group containing `category_slug`, if any
pub fn group_of(category_slug: &str) -> Option<&'static str> {
    CATEGORY_GROUPS
        .iter()
        .find(|g| g.members.contains(&category_slug))
        .map(|g| g.slug)
}

/// Partition categories into taxonomy groups, in taxonomy order
///
/// Empty groups are omitted. Members keep their input order. Categories that
/// belong to no group are collected into a trailing "Outros" group.
pub fn group_categories(categories: &[Category]) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = CATEGORY_GROUPS
        .iter()
        .map(|def| CategoryGroup {
            slug: def.slug.to_string(),
            name: def.name.to_string(),
            categories: categories
                .iter()
                .filter(|c| def.members.contains(&c.slug.as_str()))
                .cloned()
                .collect(),
        })
        .filter(|g| !g.categories.is_empty())
        .collect();

    let ungrouped: Vec<Category> = categories
        .iter()
        .filter(|c| group_of(&c.slug).is_none())
        .cloned()
        .collect();

    if !ungrouped.is_empty() {
        groups.push(CategoryGroup {
            slug: OTHER_GROUP_SLUG.to_string(),
            name: OTHER_GROUP_NAME.to_string(),
            categories: ungrouped,
        });
    }

    groups
}
