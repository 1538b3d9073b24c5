//! Tests for providers module
//!
//! The in-memory search pipeline, provider persistence (listing query,
//! become-provider transaction, category replacement) and the detail route.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::categories::Category;
    use crate::common::test_support::*;
    use crate::common::{ApiError, Validator};
    use crate::providers::models::*;
    use crate::providers::search::*;
    use crate::providers::services::{like_pattern, normalize_whatsapp, ProviderService};
    use crate::providers::validators::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Extension,
    };
    use tower::ServiceExt;

    fn category(slug: &str, name: &str) -> Category {
        Category {
            id: format!("C_{}", slug.to_uppercase()),
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    fn provider(
        id: &str,
        name: Option<&str>,
        rating: Option<f64>,
        created_at: &str,
        categories: Vec<Category>,
    ) -> ProviderWithDetails {
        ProviderWithDetails {
            id: id.to_string(),
            user_id: format!("U_{}", id),
            description: Some(format!("Atendimento de {}", id)),
            neighborhood: Some("Centro".to_string()),
            city: Some("Campinas".to_string()),
            whatsapp: None,
            is_active: true,
            verification_status: "none".to_string(),
            is_verified: false,
            verified_at: None,
            created_at: created_at.to_string(),
            user: name.map(|n| ProviderUser {
                full_name: n.to_string(),
                avatar_url: None,
            }),
            categories,
            average_rating: rating,
            review_count: if rating.is_some() { 2 } else { 0 },
        }
    }

    fn ids(response: &SearchResponse) -> Vec<&str> {
        response.providers.iter().map(|p| p.id.as_str()).collect()
    }

    // ============================================================================
    // Search pipeline
    // ============================================================================

    #[test]
    fn test_sort_scenario_rating_and_recent() {
        let list = vec![
            provider("ana", Some("Ana"), Some(4.5), "2024-01-01T00:00:00.000Z", vec![]),
            provider("bia", Some("Bia"), None, "2024-03-01T00:00:00.000Z", vec![]),
        ];

        let by_rating = SearchFilters {
            sort: SortOrder::parse(Some("avaliacao")),
            ..Default::default()
        };
        let response = search(list.clone(), &by_rating, Pagination::default());
        assert_eq!(ids(&response), vec!["ana", "bia"]);

        let response = search(list, &SearchFilters::default(), Pagination::default());
        assert_eq!(ids(&response), vec!["bia", "ana"]);
    }

    #[test]
    fn test_rating_sort_is_stable_for_ties() {
        let list = vec![
            provider("a", Some("A"), None, "2024-01-01T00:00:00.000Z", vec![]),
            provider("b", Some("B"), Some(0.0), "2024-01-02T00:00:00.000Z", vec![]),
            provider("c", Some("C"), Some(3.0), "2024-01-03T00:00:00.000Z", vec![]),
            provider("d", Some("D"), None, "2024-01-04T00:00:00.000Z", vec![]),
        ];
        let mut sorted = list;
        sort_providers(&mut sorted, SortOrder::Rating);
        let order: Vec<&str> = sorted.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_category_filter_keeps_only_members() {
        let eletricista = category("eletricista", "Eletricista");
        let pintor = category("pintor", "Pintor");
        let list = vec![
            provider("p1", Some("Um"), None, "2024-01-01T00:00:00.000Z", vec![eletricista.clone()]),
            provider("p2", Some("Dois"), None, "2024-01-02T00:00:00.000Z", vec![pintor.clone()]),
            provider(
                "p3",
                Some("Três"),
                None,
                "2024-01-03T00:00:00.000Z",
                vec![pintor, eletricista],
            ),
            provider("p4", Some("Quatro"), None, "2024-01-04T00:00:00.000Z", vec![]),
        ];

        let filters = SearchFilters {
            category: Some("eletricista".to_string()),
            ..Default::default()
        };
        let response = search(list, &filters, Pagination::default());
        assert_eq!(response.total, 2);
        assert!(response
            .providers
            .iter()
            .all(|p| p.categories.iter().any(|c| c.slug == "eletricista")));
    }

    #[test]
    fn test_text_search_over_name_description_and_categories() {
        let list = vec![
            provider("p1", Some("Carlos Reparos"), None, "2024-01-01T00:00:00.000Z", vec![]),
            provider(
                "p2",
                Some("Marta"),
                None,
                "2024-01-02T00:00:00.000Z",
                vec![category("encanador", "Encanador")],
            ),
            provider("p3", Some("Zé"), None, "2024-01-03T00:00:00.000Z", vec![]),
        ];

        let find = |text: &str| {
            let filters = SearchFilters {
                text: Some(text.to_string()),
                ..Default::default()
            };
            let response = search(list.clone(), &filters, Pagination::default());
            ids(&response).into_iter().map(str::to_string).collect::<Vec<_>>()
        };

        assert_eq!(find("carlos"), vec!["p1"]);
        assert_eq!(find("ENCANA"), vec!["p2"]);
        assert_eq!(find("atendimento de p3"), vec!["p3"]);
        assert!(find("astronauta").is_empty());
    }

    #[test]
    fn test_orphans_are_dropped() {
        let list = vec![
            provider("ok", Some("Ana"), None, "2024-01-01T00:00:00.000Z", vec![]),
            provider("orphan", None, Some(5.0), "2024-02-01T00:00:00.000Z", vec![]),
        ];
        let response = search(list, &SearchFilters::default(), Pagination::default());
        assert_eq!(ids(&response), vec!["ok"]);
        assert_eq!(response.total, 1);
    }

    #[test]
    fn test_pagination_clamps_and_slices() {
        assert_eq!(Pagination::new(None, None), Pagination { page: 1, page_size: 12 });
        assert_eq!(Pagination::new(Some(0), Some(500)), Pagination { page: 1, page_size: 50 });
        assert_eq!(Pagination::new(Some(-4), Some(0)), Pagination { page: 1, page_size: 1 });

        let list: Vec<ProviderWithDetails> = (0..5)
            .map(|i| {
                provider(
                    &format!("p{}", i),
                    Some("Nome"),
                    None,
                    &format!("2024-01-0{}T00:00:00.000Z", i + 1),
                    vec![],
                )
            })
            .collect();

        let page_two = search(list.clone(), &SearchFilters::default(), Pagination::new(Some(2), Some(2)));
        assert_eq!(page_two.total, 5);
        assert_eq!(page_two.total_pages, 3);
        assert_eq!(ids(&page_two), vec!["p2", "p1"]);

        let beyond = search(list, &SearchFilters::default(), Pagination::new(Some(9), Some(2)));
        assert!(beyond.providers.is_empty());
        assert_eq!(beyond.total, 5);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse(Some("avaliacao")), SortOrder::Rating);
        assert_eq!(SortOrder::parse(Some("recentes")), SortOrder::Recent);
        assert_eq!(SortOrder::parse(None), SortOrder::Recent);
    }

    // ============================================================================
    // Validation helpers
    // ============================================================================

    #[test]
    fn test_whatsapp_rules() {
        assert!(is_valid_whatsapp(""));
        assert!(is_valid_whatsapp("(11) 98765-4321"));
        assert!(is_valid_whatsapp("1133334444"));
        assert!(!is_valid_whatsapp("98765-4321"));
        assert!(!is_valid_whatsapp("+55 11 98765-4321"));
        assert_eq!(normalize_whatsapp(Some("(11) 98765-4321")).as_deref(), Some("11987654321"));
        assert_eq!(normalize_whatsapp(Some(" - ")), None);
    }

    #[test]
    fn test_become_provider_validation() {
        let request = BecomeProviderRequest {
            description: None,
            neighborhood: None,
            city: "  ".to_string(),
            whatsapp: Some("123".to_string()),
            category_ids: vec![" ".to_string()],
        };
        let result = ProviderValidator.validate(&request);
        assert!(result.has_error("city"));
        assert!(result.has_error("whatsapp"));
        assert!(result.has_error("category_ids"));

        let empty_update = UpdateProviderRequest::default();
        assert!(ProviderValidator.validate(&empty_update).has_error("body"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("São"), "%São%");
        assert_eq!(like_pattern("50%_off"), r"%50\%\_off%");
    }

    #[test]
    fn test_normalize_category_ids() {
        let ids = vec![" C_1 ".to_string(), "C_2".to_string(), "C_1".to_string(), "".to_string()];
        assert_eq!(normalize_category_ids(&ids), vec!["C_1", "C_2"]);
    }

    // ============================================================================
    // Persistence
    // ============================================================================

    #[tokio::test]
    async fn test_fetch_active_filters_and_aggregates() {
        let pool = test_pool().await;
        let (_, ana) =
            insert_provider_user(&pool, "ana@example.com", "Ana", "2024-01-01T00:00:00.000Z").await;
        let bia_user = insert_user(&pool, "bia@example.com", "Bia", "PROVIDER").await;
        let bia = insert_provider(&pool, &bia_user, "Campinas", "Cambuí", "2024-03-01T00:00:00.000Z").await;
        let caio_user = insert_user(&pool, "caio@example.com", "Caio", "PROVIDER").await;
        let caio = insert_provider(&pool, &caio_user, "São Paulo", "Moema", "2024-02-01T00:00:00.000Z").await;
        sqlx::query("UPDATE provider_profiles SET is_active = 0 WHERE id = ?")
            .bind(&caio)
            .execute(&pool)
            .await
            .unwrap();

        link_category(&pool, &ana, "pintor").await;
        link_category(&pool, &ana, "eletricista").await;
        let c1 = insert_user(&pool, "c1@example.com", "Cliente 1", "CLIENT").await;
        let c2 = insert_user(&pool, "c2@example.com", "Cliente 2", "CLIENT").await;
        insert_review(&pool, &ana, &c1, 4).await;
        insert_review(&pool, &ana, &c2, 5).await;

        let service = ProviderService::new(pool);

        let all = service.fetch_active(None, None).await.unwrap();
        let order: Vec<&str> = all.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec![bia.as_str(), ana.as_str()]);

        let ana_row = all.iter().find(|p| p.id == ana).unwrap();
        assert_eq!(ana_row.average_rating, Some(4.5));
        assert_eq!(ana_row.review_count, 2);
        let names: Vec<&str> = ana_row.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Eletricista", "Pintor"]);
        assert_eq!(ana_row.display_name(), "Ana");

        let bia_row = all.iter().find(|p| p.id == bia).unwrap();
        assert_eq!(bia_row.average_rating, None);
        assert_eq!(bia_row.review_count, 0);

        let in_campinas = service.fetch_active(Some("campinas"), None).await.unwrap();
        assert_eq!(in_campinas.len(), 1);
        assert_eq!(in_campinas[0].id, bia);

        let in_pinheiros = service.fetch_active(None, Some("PINHEIROS")).await.unwrap();
        assert_eq!(in_pinheiros.len(), 1);
        assert_eq!(in_pinheiros[0].id, ana);

        assert_eq!(service.list_cities().await.unwrap(), vec!["Campinas", "São Paulo"]);
        assert_eq!(
            service.list_neighborhoods(Some("Campinas")).await.unwrap(),
            vec!["Cambuí"]
        );
        let counts = service.category_counts().await.unwrap();
        assert_eq!(counts.get("pintor"), Some(&1));
    }

    #[tokio::test]
    async fn test_orphan_profile_is_hidden() {
        let pool = test_pool().await;
        let (user_id, provider_id) =
            insert_provider_user(&pool, "ana@example.com", "Ana", "2024-01-01T00:00:00.000Z").await;
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&user_id)
            .execute(&pool)
            .await
            .unwrap();

        let service = ProviderService::new(pool);
        assert!(service.get_details(&provider_id).await.unwrap().is_none());
        assert!(service.list_cities().await.unwrap().is_empty());

        let active = service.fetch_active(None, None).await.unwrap();
        let response = search(active, &SearchFilters::default(), Pagination::default());
        assert_eq!(response.total, 0);
    }

    #[tokio::test]
    async fn test_become_provider_is_atomic() {
        let pool = test_pool().await;
        let user_id = insert_user(&pool, "ana@example.com", "Ana", "CLIENT").await;
        let pintor = category_id(&pool, "pintor").await;
        let service = ProviderService::new(pool.clone());

        let bad = BecomeProviderRequest {
            description: None,
            neighborhood: None,
            city: "Campinas".to_string(),
            whatsapp: None,
            category_ids: vec![pintor.clone(), "C_UNKNOWN".to_string()],
        };
        let refused = service.become_provider(&user_id, &bad).await;
        assert!(matches!(refused, Err(ApiError::ValidationError(_))));
        assert!(service.get_profile_by_user(&user_id).await.unwrap().is_none());

        let request = BecomeProviderRequest {
            description: Some("  Pinturas em geral ".to_string()),
            neighborhood: Some("Cambuí".to_string()),
            city: " Campinas ".to_string(),
            whatsapp: Some("(19) 99876-5432".to_string()),
            category_ids: vec![pintor.clone(), pintor.clone()],
        };
        let profile = service.become_provider(&user_id, &request).await.unwrap();
        assert_eq!(profile.city.as_deref(), Some("Campinas"));
        assert_eq!(profile.description.as_deref(), Some("Pinturas em geral"));
        assert_eq!(profile.whatsapp.as_deref(), Some("19998765432"));
        assert_eq!(profile.verification_status, "none");
        assert!(profile.is_active);

        let (role,): (String,) = sqlx::query_as("SELECT role FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(role, "PROVIDER");

        let details = service.get_details(&profile.id).await.unwrap().unwrap();
        assert_eq!(details.categories.len(), 1);
        assert_eq!(details.categories[0].slug, "pintor");

        let again = service.become_provider(&user_id, &request).await;
        assert!(matches!(again, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_and_replace_categories() {
        let pool = test_pool().await;
        let (user_id, provider_id) =
            insert_provider_user(&pool, "ana@example.com", "Ana", "2024-01-01T00:00:00.000Z").await;
        link_category(&pool, &provider_id, "pintor").await;
        let diarista = category_id(&pool, "diarista").await;
        let eletricista = category_id(&pool, "eletricista").await;
        let service = ProviderService::new(pool);

        let update = UpdateProviderRequest {
            description: Some("   ".to_string()),
            whatsapp: Some("".to_string()),
            is_active: Some(false),
            category_ids: Some(vec![diarista.clone()]),
            ..Default::default()
        };
        let profile = service.update_profile(&user_id, &update).await.unwrap();
        assert_eq!(profile.description, None);
        assert_eq!(profile.whatsapp, None);
        assert!(!profile.is_active);
        assert_eq!(profile.city.as_deref(), Some("São Paulo"));

        let replaced = service
            .replace_categories(&provider_id, &[eletricista.clone(), diarista.clone()])
            .await
            .unwrap();
        let slugs: Vec<&str> = replaced.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["diarista", "eletricista"]);

        let unknown = service
            .replace_categories(&provider_id, &["C_UNKNOWN".to_string()])
            .await;
        assert!(matches!(unknown, Err(ApiError::ValidationError(_))));
        let kept = service
            .categories_for(&[provider_id.clone()])
            .await
            .unwrap()
            .remove(&provider_id)
            .unwrap();
        assert_eq!(kept.len(), 2);

        let missing = service.update_profile("U_NOBODY", &update).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    // ============================================================================
    // Routes
    // ============================================================================

    #[tokio::test]
    async fn test_detail_route_for_anonymous_visitor() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let (_, provider_id) =
            insert_provider_user(&state.db, "ana@example.com", "Ana", "2024-01-01T00:00:00.000Z").await;
        let app = providers_routes().layer(Extension(shared(state)));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/providers/{}", provider_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["provider"]["user"]["full_name"], "Ana");
        assert_eq!(json["already_reviewed"], true);
        assert_eq!(json["is_favorited"], false);
        assert_eq!(json["is_owner"], false);
        assert!(json["whatsapp_url"]
            .as_str()
            .unwrap()
            .starts_with("https://wa.me/5511987654321?text="));

        let missing = app
            .oneshot(
                Request::builder()
                    .uri("/api/providers/P_MISSING")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_route_with_portuguese_params() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let (_, ana) =
            insert_provider_user(&state.db, "ana@example.com", "Ana", "2024-01-01T00:00:00.000Z").await;
        link_category(&state.db, &ana, "pintor").await;
        insert_provider_user(&state.db, "bia@example.com", "Bia", "2024-03-01T00:00:00.000Z").await;
        let app = providers_routes().layer(Extension(shared(state)));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/providers?categoria=pintor&cidade=paulo&pagina=1&por_pagina=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["page_size"], 5);
        assert_eq!(json["providers"][0]["id"], ana.as_str());
    }
}
