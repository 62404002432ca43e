use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use pdf_storybook_runtime::{
    BookletOptions, CompressOptions, JobCommand, JobId, JobStats, JobUpdate, worker_task,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// Create a test PDF where every page is covered by one small image
fn create_test_pdf(num_pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for i in 0..num_pages {
        let pixels: Vec<u8> = (0..16 * 16)
            .flat_map(|p| [(p * 7 + i * 40) as u8, (p * 3) as u8, 128])
            .collect();
        let image_id = doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 16,
                    "Height" => 16,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                pixels,
            )
            .with_compression(false),
        );
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            b"q 300 0 0 400 0 0 cm /Im0 Do Q".to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(300),
                Object::Integer(400),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => num_pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

async fn next_update(rx: &mut mpsc::UnboundedReceiver<JobUpdate>) -> JobUpdate {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("worker stalled")
        .expect("worker hung up")
}

#[tokio::test]
async fn test_compress_job_completes() {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(worker_task(command_rx, update_tx));

    command_tx
        .send(JobCommand::Compress {
            job_id: JobId(1),
            input: create_test_pdf(3),
            options: CompressOptions::default(),
        })
        .unwrap();

    let started = next_update(&mut update_rx).await;
    assert!(matches!(started, JobUpdate::Started { job_id: JobId(1) }));
    assert!(!started.is_final());

    match next_update(&mut update_rx).await {
        JobUpdate::Completed {
            job_id,
            output,
            stats: JobStats::Compress(stats),
        } => {
            assert_eq!(job_id, JobId(1));
            assert_eq!(stats.pages, 3);
            assert_eq!(stats.compressed_size, output.len());
            assert_eq!(&output[..5], b"%PDF-");
        }
        other => panic!("unexpected update: {:?}", other),
    }

    drop(command_tx);
    worker.await.unwrap();
}

#[tokio::test]
async fn test_invalid_input_fails_job() {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(worker_task(command_rx, update_tx));

    command_tx
        .send(JobCommand::Booklet {
            job_id: JobId(7),
            input: b"not a pdf".to_vec(),
            options: BookletOptions::default(),
        })
        .unwrap();

    assert!(matches!(
        next_update(&mut update_rx).await,
        JobUpdate::Started { job_id: JobId(7) }
    ));
    let update = next_update(&mut update_rx).await;
    assert!(update.is_final());
    match update {
        JobUpdate::Failed { job_id, message } => {
            assert_eq!(job_id, JobId(7));
            assert!(!message.is_empty());
        }
        other => panic!("unexpected update: {:?}", other),
    }

    drop(command_tx);
    worker.await.unwrap();
}

#[tokio::test]
async fn test_cancel_before_job_runs() {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();

    // both commands are queued before the worker first polls
    command_tx
        .send(JobCommand::Compress {
            job_id: JobId(2),
            input: create_test_pdf(4),
            options: CompressOptions::default(),
        })
        .unwrap();
    command_tx
        .send(JobCommand::Cancel { job_id: JobId(2) })
        .unwrap();
    let worker = tokio::spawn(worker_task(command_rx, update_tx));

    assert!(matches!(
        next_update(&mut update_rx).await,
        JobUpdate::Started { job_id: JobId(2) }
    ));
    let update = next_update(&mut update_rx).await;
    assert_eq!(update.job_id(), JobId(2));
    assert!(matches!(update, JobUpdate::Cancelled { .. }));

    drop(command_tx);
    worker.await.unwrap();
}

#[tokio::test]
async fn test_cancel_unknown_job_is_ignored() {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(worker_task(command_rx, update_tx));

    command_tx
        .send(JobCommand::Cancel { job_id: JobId(99) })
        .unwrap();
    drop(command_tx);
    worker.await.unwrap();

    assert!(update_rx.recv().await.is_none());
}

#[tokio::test]
async fn test_duplicate_job_id_is_ignored() {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();

    for _ in 0..2 {
        command_tx
            .send(JobCommand::Compress {
                job_id: JobId(5),
                input: create_test_pdf(2),
                options: CompressOptions::default(),
            })
            .unwrap();
    }
    drop(command_tx);
    tokio::time::timeout(Duration::from_secs(60), worker_task(command_rx, update_tx))
        .await
        .expect("worker stalled");

    let mut updates = Vec::new();
    while let Some(update) = update_rx.recv().await {
        updates.push(update);
    }
    assert_eq!(updates.len(), 2);
    assert!(matches!(updates[0], JobUpdate::Started { job_id: JobId(5) }));
    assert!(matches!(
        updates[1],
        JobUpdate::Completed {
            job_id: JobId(5),
            ..
        }
    ));
}
