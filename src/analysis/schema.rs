// SPDX-License-Identifier: GPL-3.0-only

//! Fixed prompt and response schema for object identification

use serde_json::{Value, json};

/// User instruction sent alongside the image
pub const IDENTIFY_INSTRUCTION: &str = "Identify the main object in this image. Provide a detailed \
analysis including its name, description, interesting facts, and key attributes (like \
lifespan/ecology for nature, or materials/utility for objects).";

/// System role for the model
pub const SYSTEM_INSTRUCTION: &str = "You are an expert biologist, engineer, and historian. Your \
goal is to identify objects and provide educational, detailed, and accurate information about them.";

/// Fields the service must always return
pub const REQUIRED_FIELDS: [&str; 5] = ["name", "category", "description", "funFacts", "attributes"];

/// OpenAPI-style schema constraining the response to an `AnalysisResult`
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": {
                "type": "STRING",
                "description": "Common name of the identified object."
            },
            "scientificName": {
                "type": "STRING",
                "description": "Scientific name if living (e.g., plants, animals), or technical name if inanimate.",
                "nullable": true
            },
            "category": {
                "type": "STRING",
                "description": "General category (e.g., Plant, Electronic, Furniture, Tool)."
            },
            "description": {
                "type": "STRING",
                "description": "A detailed and engaging description of the object, explaining what it is and its primary function or characteristics."
            },
            "funFacts": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "3-5 interesting or surprising facts about the object."
            },
            "attributes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": {
                            "type": "STRING",
                            "description": "Attribute name (e.g., 'Lifespan', 'Origin', 'Ecological Role')."
                        },
                        "value": {
                            "type": "STRING",
                            "description": "Value of the attribute."
                        }
                    },
                    "required": ["label", "value"]
                },
                "description": "Key attributes. For living things include lifespan, habitat, ecological importance. For objects include material, usage, history."
            }
        },
        "required": REQUIRED_FIELDS
    })
}
