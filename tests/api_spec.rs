use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use leanwave::api::{
    create_router, AnalyzeRequest, InsightRequest, InsightResponse, InstructionRequest,
    InstructionResponse, SequenceRequest,
};
use leanwave::db::Database;
use leanwave::models::*;
use leanwave::planner::{Planner, FORMAT_DIRECTIVE, INSIGHT_UNAVAILABLE};
use serde::Deserialize;
use uuid::Uuid;

fn setup_with_db() -> (TestServer, Database) {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let planner = Planner::heuristic().with_store(Arc::new(db.clone()));
    let app = create_router(db.clone(), planner);
    (
        TestServer::new(app).expect("Failed to create test server"),
        db,
    )
}

fn setup() -> TestServer {
    setup_with_db().0
}

async fn create_test_project(server: &TestServer, tech_stack: Option<&str>) -> Project {
    server
        .post("/api/v1/projects")
        .json(&CreateProjectInput {
            name: "Test Project".to_string(),
            description: None,
            tech_stack: tech_stack.map(String::from),
        })
        .await
        .json::<Project>()
}

fn analyze(idea: &str, project_id: &str, use_ai: bool) -> AnalyzeRequest {
    AnalyzeRequest {
        idea: idea.to_string(),
        project_id: project_id.to_string(),
        use_ai,
    }
}

fn make_feature(title: &str, risk: Risk, value: u8) -> Feature {
    Feature {
        id: title.to_lowercase().replace(' ', "-"),
        project_id: "p1".to_string(),
        title: title.to_string(),
        description: format!("{} description", title),
        size: Size::M,
        risk,
        business_value: value,
        wow_factor: false,
        category: Category::Logic,
    }
}

/// A wave as clients read it from the API.
#[derive(Debug, Deserialize)]
struct WaveBody {
    number: usize,
    features: Vec<Feature>,
    has_high_risk: bool,
}

fn titles(wave: &WaveBody) -> Vec<&str> {
    wave.features.iter().map(|f| f.title.as_str()).collect()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

mod projects {
    use super::*;

    #[tokio::test]
    async fn creates_and_fetches_a_project() {
        let server = setup();

        let response = server
            .post("/api/v1/projects")
            .json(&CreateProjectInput {
                name: "Art Market".to_string(),
                description: Some("NFT auctions".to_string()),
                tech_stack: Some("Solidity".to_string()),
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let project: Project = response.json();

        let fetched = server
            .get(&format!("/api/v1/projects/{}", project.id))
            .await
            .json::<Project>();
        assert_eq!(fetched.name, "Art Market");
        assert_eq!(fetched.tech_stack, Some("Solidity".to_string()));
    }

    #[tokio::test]
    async fn rejects_an_empty_name() {
        let server = setup();

        let response = server
            .post("/api/v1/projects")
            .json(&CreateProjectInput {
                name: "   ".to_string(),
                description: None,
                tech_stack: None,
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lists_projects() {
        let server = setup();
        create_test_project(&server, None).await;

        let projects: Vec<Project> = server.get("/api/v1/projects").await.json();
        assert_eq!(projects.len(), 1);
    }

    #[tokio::test]
    async fn returns_404_for_unknown_project() {
        let server = setup();

        let response = server
            .get(&format!("/api/v1/projects/{}", Uuid::new_v4()))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletes_a_project() {
        let server = setup();
        let project = create_test_project(&server, None).await;

        server
            .delete(&format!("/api/v1/projects/{}", project.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .delete(&format!("/api/v1/projects/{}", project.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod analyses {
    use super::*;

    #[tokio::test]
    async fn heuristic_analysis_persists_to_a_real_project() {
        let (server, db) = setup_with_db();
        let project = create_test_project(&server, None).await;
        let project_id = project.id.to_string();

        let response = server
            .post("/api/v1/analyses")
            .json(&analyze("A crypto wallet for art auctions", &project_id, false))
            .await;

        response.assert_status_ok();
        let outcome: AnalysisOutcome = response.json();
        assert_eq!(outcome.mode, Mode::Heuristic);
        assert!(outcome.persisted);
        assert!(outcome.queries.is_empty());
        assert!(outcome.sources.is_empty());

        let titles: Vec<&str> = outcome.features.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Web3 Wallet Connection", "Auction System"]);

        let stored = db.get_features_by_project(&project_id).expect("Query failed");
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|f| f.project_id == project_id));
    }

    #[tokio::test]
    async fn placeholder_project_is_never_persisted() {
        let server = setup();

        let response = server
            .post("/api/v1/analyses")
            .json(&serde_json::json!({ "idea": "An online shop" }))
            .await;

        response.assert_status_ok();
        let outcome: AnalysisOutcome = response.json();
        assert!(!outcome.persisted);
        assert_eq!(outcome.features.len(), 1);
        assert_eq!(outcome.features[0].title, "Shopping Cart");
        assert_eq!(outcome.features[0].project_id, PLACEHOLDER_PROJECT_ID);
    }

    #[tokio::test]
    async fn unmatched_idea_yields_the_core_feature() {
        let server = setup();

        let outcome: AnalysisOutcome = server
            .post("/api/v1/analyses")
            .json(&analyze("Weather forecasts for sailors", PLACEHOLDER_PROJECT_ID, false))
            .await
            .json();

        assert_eq!(outcome.features.len(), 1);
        assert_eq!(outcome.features[0].title, "Core Feature");
    }

    #[tokio::test]
    async fn rejects_an_empty_idea() {
        let server = setup();

        let response = server
            .post("/api/v1/analyses")
            .json(&analyze("  ", PLACEHOLDER_PROJECT_ID, false))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn grounded_analysis_without_configuration_is_unavailable() {
        let server = setup();

        let response = server
            .post("/api/v1/analyses")
            .json(&analyze("A crypto wallet", PLACEHOLDER_PROJECT_ID, true))
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_project_is_a_bad_request() {
        let server = setup();

        let response = server
            .post("/api/v1/analyses")
            .json(&analyze("A crypto wallet", &Uuid::new_v4().to_string(), false))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("Project not found"));
    }
}

mod waves {
    use super::*;

    #[tokio::test]
    async fn sequences_posted_features() {
        let server = setup();
        let features = vec![
            make_feature("Auction", Risk::High, 10),
            make_feature("Escrow", Risk::High, 9),
            make_feature("Login", Risk::Low, 8),
            make_feature("Gallery", Risk::Low, 7),
        ];

        let response = server
            .post("/api/v1/waves")
            .json(&SequenceRequest { features })
            .await;

        response.assert_status_ok();
        let waves: Vec<WaveBody> = response.json();
        assert_eq!(waves.len(), 2);

        assert_eq!(titles(&waves[0]), vec!["Auction", "Login", "Gallery"]);
        assert_eq!(titles(&waves[1]), vec!["Escrow"]);
        assert!(waves.iter().all(|w| w.has_high_risk));
    }

    #[tokio::test]
    async fn rejects_duplicate_feature_ids() {
        let server = setup();
        let mut twin = make_feature("Escrow", Risk::High, 9);
        twin.id = "auction".to_string();

        let response = server
            .post("/api/v1/waves")
            .json(&SequenceRequest {
                features: vec![make_feature("Auction", Risk::High, 10), twin],
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("duplicated"));
    }

    #[tokio::test]
    async fn rejects_business_value_out_of_range() {
        let server = setup();

        for value in [0, 11] {
            let response = server
                .post("/api/v1/waves")
                .json(&SequenceRequest {
                    features: vec![make_feature("Auction", Risk::Low, value)],
                })
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert!(response.text().contains("business_value"));
        }
    }

    #[tokio::test]
    async fn rejects_an_empty_title() {
        let server = setup();
        let mut untitled = make_feature("Auction", Risk::Low, 5);
        untitled.title = " ".to_string();

        server
            .post("/api/v1/waves")
            .json(&SequenceRequest {
                features: vec![untitled],
            })
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_backlog_gives_no_waves() {
        let server = setup();

        let waves: Vec<WaveBody> = server
            .post("/api/v1/waves")
            .json(&SequenceRequest { features: vec![] })
            .await
            .json();

        assert!(waves.is_empty());
    }

    #[tokio::test]
    async fn sequences_a_project_backlog() {
        let server = setup();
        let project = create_test_project(&server, None).await;

        server
            .post("/api/v1/analyses")
            .json(&analyze(
                "NFT auction marketplace with user login",
                &project.id.to_string(),
                false,
            ))
            .await
            .assert_status_ok();

        let response = server
            .get(&format!("/api/v1/projects/{}/waves", project.id))
            .await;

        response.assert_status_ok();
        let waves: Vec<WaveBody> = response.json();
        assert_eq!(waves.len(), 1);
        assert_eq!(waves[0].number, 1);
        assert!(waves[0].has_high_risk);
        assert_eq!(
            titles(&waves[0]),
            vec!["Auction System", "Shopping Cart", "Web3 Wallet Connection"]
        );
    }

    #[tokio::test]
    async fn unknown_project_waves_are_not_found() {
        let server = setup();

        server
            .get(&format!("/api/v1/projects/{}/waves", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod instructions {
    use super::*;

    #[tokio::test]
    async fn synthesizes_an_instruction_for_a_posted_feature() {
        let server = setup();
        let mut feature = make_feature("Item Gallery", Risk::Low, 9);
        feature.category = Category::Ui;
        feature.size = Size::L;

        let response = server
            .post("/api/v1/instructions")
            .json(&InstructionRequest {
                feature,
                tech_stack: "React".to_string(),
            })
            .await;

        response.assert_status_ok();
        let body: InstructionResponse = response.json();
        assert_eq!(body.instruction.role, "Senior Frontend Engineer");
        assert_eq!(
            body.instruction.task,
            "Create presentation component AND Create container component"
        );
        assert_eq!(body.instruction.format, FORMAT_DIRECTIVE);
        assert_eq!(
            body.instruction.context.get("strategy").map(String::as_str),
            Some("chain-of-thought")
        );
        assert!(body.rendered.starts_with("# ROLE\nAct as a Senior Frontend Engineer."));
    }

    #[tokio::test]
    async fn rejects_an_invalid_posted_feature() {
        let server = setup();
        let mut feature = make_feature("Item Gallery", Risk::Low, 12);
        feature.id = String::new();

        let response = server
            .post("/api/v1/instructions")
            .json(&InstructionRequest {
                feature,
                tech_stack: "React".to_string(),
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn uses_the_project_tech_stack_by_default() {
        let (server, db) = setup_with_db();
        let project = create_test_project(&server, Some("Solidity + Hardhat")).await;
        let project_id = project.id.to_string();

        server
            .post("/api/v1/analyses")
            .json(&analyze("auction house", &project_id, false))
            .await
            .assert_status_ok();
        let feature = db
            .get_features_by_project(&project_id)
            .expect("Query failed")
            .remove(0);

        let body: InstructionResponse = server
            .get(&format!(
                "/api/v1/projects/{}/features/{}/instruction",
                project.id, feature.id
            ))
            .await
            .json();
        assert_eq!(body.instruction.role, "Senior Smart Contract Engineer");

        let expected: BTreeMap<String, String> = body.instruction.context.clone();
        assert_eq!(expected.get("feature_id"), Some(&feature.id));
        assert_eq!(
            expected.get("tech_stack").map(String::as_str),
            Some("Solidity + Hardhat")
        );

        let overridden: InstructionResponse = server
            .get(&format!(
                "/api/v1/projects/{}/features/{}/instruction",
                project.id, feature.id
            ))
            .add_query_param("tech_stack", "Rust")
            .await
            .json();
        assert_eq!(overridden.instruction.role, "Senior Backend Engineer");
    }

    #[tokio::test]
    async fn unknown_feature_is_not_found() {
        let server = setup();
        let project = create_test_project(&server, None).await;

        server
            .get(&format!(
                "/api/v1/projects/{}/features/missing/instruction",
                project.id
            ))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod insights {
    use super::*;

    #[tokio::test]
    async fn degrades_without_a_provider() {
        let server = setup();

        let response = server
            .post("/api/v1/insights")
            .json(&InsightRequest {
                idea: "A crypto wallet".to_string(),
            })
            .await;

        response.assert_status_ok();
        let body: InsightResponse = response.json();
        assert_eq!(body.insight, INSIGHT_UNAVAILABLE);
    }

    #[tokio::test]
    async fn rejects_an_empty_idea() {
        let server = setup();

        server
            .post("/api/v1/insights")
            .json(&InsightRequest {
                idea: String::new(),
            })
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
