mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use common::{DataApiStub, HashEmbedder, csv_file, inserted, point, sent_ids};
use rag_store::{
    CollectionBinding, IngestionConfig, IngestionPipeline, RagError, VectorIndex,
    index::astra::MAX_INSERT_BATCH,
};
use serde_json::json;

fn points(n: usize) -> Vec<rag_store::IndexPoint> {
    (0..n).map(|i| point(format!("p{i}"), "Great budget headphone")).collect()
}

#[tokio::test]
async fn large_insert_is_split_into_unordered_chunks() {
    let stub = DataApiStub::start(|cmd| (200, inserted(&sent_ids(cmd)))).await;
    let coll = stub.index().open_collection("reviews").await.unwrap();

    let outcome = coll.insert_many(points(150)).await.unwrap();
    assert_eq!(outcome.inserted.len(), 150);
    assert!(outcome.rejected.is_empty());

    let inserts = stub.inserts();
    assert_eq!(inserts.len(), 2);
    assert_eq!(sent_ids(&inserts[0]).len(), MAX_INSERT_BATCH);
    assert_eq!(sent_ids(&inserts[1]).len(), 50);
    assert_eq!(inserts[0]["insertMany"]["options"]["ordered"], false);

    let doc = &inserts[0]["insertMany"]["documents"][0];
    assert_eq!(doc["content"], "Great budget headphone");
    assert_eq!(doc["metadata"]["product_name"], "Headphone X");
    assert_eq!(doc["$vector"], json!([1.0, 0.0]));
}

#[tokio::test]
async fn unacknowledged_ids_are_rejected() {
    let stub = DataApiStub::start(|cmd| {
        let ids = sent_ids(cmd);
        (200, inserted(&ids[..2]))
    })
    .await;
    let coll = stub.index().open_collection("reviews").await.unwrap();

    let outcome = coll.insert_many(points(3)).await.unwrap();
    assert_eq!(outcome.inserted, ["p0", "p1"]);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].0, "p2");
    assert!(outcome.rejected[0].1.contains("not acknowledged"));
}

#[tokio::test]
async fn errors_with_some_ids_reject_only_the_rest() {
    let stub = DataApiStub::start(|cmd| {
        let ids = sent_ids(cmd);
        (
            200,
            json!({
                "status": { "insertedIds": [ids[0]] },
                "errors": [{ "message": "document too large", "errorCode": "DOCUMENT_TOO_LARGE" }]
            }),
        )
    })
    .await;
    let coll = stub.index().open_collection("reviews").await.unwrap();

    let outcome = coll.insert_many(points(2)).await.unwrap();
    assert_eq!(outcome.inserted, ["p0"]);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].0, "p1");
    assert_eq!(outcome.rejected[0].1, "DOCUMENT_TOO_LARGE: document too large");
}

#[tokio::test]
async fn errors_without_ids_fail_the_call() {
    let stub = DataApiStub::start(|_| {
        (
            200,
            json!({ "errors": [{ "message": "collection not found", "errorCode": "COLLECTION_NOT_EXIST" }] }),
        )
    })
    .await;
    let coll = stub.index().open_collection("reviews").await.unwrap();

    match coll.insert_many(points(2)).await {
        Err(RagError::VectorIndex { backend, message }) => {
            assert_eq!(backend, "astra_db");
            assert!(message.contains("COLLECTION_NOT_EXIST"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn failed_chunk_keeps_earlier_acknowledgements() {
    let calls = AtomicUsize::new(0);
    let stub = DataApiStub::start(move |cmd| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            (200, inserted(&sent_ids(cmd)))
        } else {
            (500, json!({ "message": "internal error" }))
        }
    })
    .await;
    let coll = stub.index().open_collection("reviews").await.unwrap();

    let outcome = coll.insert_many(points(150)).await.unwrap();
    assert_eq!(outcome.inserted.len(), 100);
    assert_eq!(outcome.rejected.len(), 50);
    assert!(outcome.rejected.iter().all(|(_, cause)| cause.contains("500")));
    assert_eq!(outcome.rejected[0].0, "p100");
}

#[tokio::test]
async fn ensure_created_skips_existing_collection() {
    let stub = DataApiStub::start(|_| (200, json!({ "status": { "collections": ["other", "reviews"] } }))).await;
    let coll = stub.index().open_collection("reviews").await.unwrap();

    coll.ensure_created(768).await.unwrap();
    let commands = stub.commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].get("findCollections").is_some());
}

#[tokio::test]
async fn ensure_created_creates_missing_cosine_collection() {
    let stub = DataApiStub::start(|cmd| {
        if cmd.get("findCollections").is_some() {
            (200, json!({ "status": { "collections": ["other"] } }))
        } else {
            (200, json!({ "status": { "ok": 1 } }))
        }
    })
    .await;
    let coll = stub.index().open_collection("reviews").await.unwrap();

    coll.ensure_created(768).await.unwrap();
    let commands = stub.commands();
    assert_eq!(commands.len(), 2);
    let create = &commands[1]["createCollection"];
    assert_eq!(create["name"], "reviews");
    assert_eq!(create["options"]["vector"]["dimension"], 768);
    assert_eq!(create["options"]["vector"]["metric"], "cosine");
}

#[tokio::test]
async fn count_reads_document_count() {
    let stub = DataApiStub::start(|_| (200, json!({ "status": { "count": 42 } }))).await;
    let coll = stub.index().open_collection("reviews").await.unwrap();

    assert_eq!(coll.count().await.unwrap(), 42);
    assert!(stub.commands()[0].get("countDocuments").is_some());
}

#[tokio::test]
async fn search_maps_documents_to_hits() {
    let stub = DataApiStub::start(|_| {
        (
            200,
            json!({ "data": { "documents": [
                {
                    "_id": "a",
                    "content": "Great budget headphone under $20",
                    "metadata": { "product_name": "Headphone X", "product_rating": 4.0, "product_summary": "Good bass" },
                    "$similarity": 0.93
                },
                { "_id": "broken", "content": "no metadata" }
            ] } }),
        )
    })
    .await;
    let coll = stub.index().open_collection("reviews").await.unwrap();

    let hits = coll.search(&[1.0, 0.0], 3).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "a");
    assert_eq!(hits[0].unit.metadata.product_name, "Headphone X");

    let find = &stub.commands()[0]["find"];
    assert_eq!(find["options"]["limit"], 3);
    assert_eq!(find["options"]["includeSimilarity"], true);
    assert_eq!(find["sort"]["$vector"], json!([1.0, 0.0]));
}

#[tokio::test]
async fn ingestion_reports_rows_stored_before_a_failed_chunk() {
    let rows: String = (0..150)
        .map(|i| format!("Headphone {i},4,Good,Review number {i} about bass\n"))
        .collect();
    let file = csv_file(&rows);

    let inserts = AtomicUsize::new(0);
    let stub = DataApiStub::start(move |cmd| {
        if cmd.get("findCollections").is_some() {
            return (200, json!({ "status": { "collections": ["reviews"] } }));
        }
        if inserts.fetch_add(1, Ordering::SeqCst) == 0 {
            (200, inserted(&sent_ids(cmd)))
        } else {
            (500, json!({ "message": "internal error" }))
        }
    })
    .await;

    let mut cfg = IngestionConfig::new("reviews");
    cfg.batch_size = 150;
    let index: Arc<dyn VectorIndex> = Arc::new(stub.index());
    let report = IngestionPipeline::new(cfg, index, Arc::new(HashEmbedder::default()))
        .unwrap()
        .run(file.path())
        .await
        .unwrap();

    assert_eq!(report.total_rows, 150);
    assert_eq!(report.inserted_count, 100);
    assert_eq!(report.inserted_ids.len(), 100);
    assert_eq!(report.failed_rows.len(), 50);
    assert_eq!(report.failed_rows[0].row, 100);
    assert_eq!(report.failed_rows[49].row, 149);
}
