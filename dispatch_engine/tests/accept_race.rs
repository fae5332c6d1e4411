//! The single-winner guarantee under genuinely concurrent accepts. These tests hammer one order
//! with simultaneous accept calls from distinct riders and assert that the store's conditional
//! update lets exactly one through, with every loser classified as a race loss.
use dispatch_engine::{
    db_types::{OrderId, OrderStatusType, RequestStatus, RiderId},
    events::EventProducers,
    traits::DispatchDatabase,
    DispatchError,
    DispatchFlowApi,
};
use futures_util::future::join_all;

mod support;

use support::{new_test_db, seed_ready_order, seed_rider, seed_vendor};

fn oid(s: &str) -> OrderId {
    OrderId(s.into())
}

fn rid(s: &str) -> RiderId {
    RiderId::from(s)
}

const NUM_RIDERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_rider_wins_an_n_way_race() {
    let db = new_test_db().await;
    seed_vendor(&db, "vend-a").await;
    let riders = (0..NUM_RIDERS).map(|i| format!("r{i}")).collect::<Vec<_>>();
    for r in &riders {
        seed_rider(&db, r, Some("vend-a")).await;
    }
    let order_id = seed_ready_order(&db, "9000", &["vend-a"]).await;

    let api = DispatchFlowApi::new(db.clone(), EventProducers::default());
    api.broadcast_order(&oid("9000")).await.unwrap();

    let tasks = riders.iter().map(|r| {
        let db = db.clone();
        let rider = rid(r);
        tokio::spawn(async move {
            let api = DispatchFlowApi::new(db, EventProducers::default());
            (rider.clone(), api.accept_order(&rider, &oid("9000")).await)
        })
    });
    let outcomes = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect::<Vec<_>>();

    let winners = outcomes.iter().filter(|(_, res)| res.is_ok()).collect::<Vec<_>>();
    assert_eq!(winners.len(), 1, "exactly one accept must succeed");
    let (winner_id, winner_result) = winners[0];
    let accepted = winner_result.as_ref().unwrap();
    assert_eq!(accepted.order.rider_id.as_ref(), Some(winner_id));
    assert_eq!(accepted.order.status, OrderStatusType::OutForDelivery);

    for (rider, res) in outcomes.iter().filter(|(_, res)| res.is_err()) {
        match res.as_ref().unwrap_err() {
            DispatchError::AlreadyAssigned { winner } => {
                assert_eq!(&winner.id, winner_id, "loser {rider} must be told the actual winner")
            },
            DispatchError::NoLongerReady { .. } => {},
            other => panic!("loser {rider} got an unexpected outcome: {other:?}"),
        }
    }

    // postconditions on the request list: one Accepted (the winner's), the rest Expired
    let requests = db.fetch_assignment_requests(order_id).await.unwrap();
    assert_eq!(requests.len(), NUM_RIDERS);
    assert_eq!(requests.iter().filter(|r| r.status == RequestStatus::Accepted).count(), 1);
    assert!(requests
        .iter()
        .all(|r| if &r.rider_id == winner_id { r.status == RequestStatus::Accepted } else { r.status == RequestStatus::Expired }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_vendor_order_race_has_one_winner_across_vendors() {
    let db = new_test_db().await;
    seed_vendor(&db, "vend-a").await;
    seed_vendor(&db, "vend-b").await;
    seed_rider(&db, "r1", Some("vend-a")).await;
    seed_rider(&db, "r2", Some("vend-b")).await;
    let order_id = seed_ready_order(&db, "9100", &["vend-a", "vend-b"]).await;

    let api = DispatchFlowApi::new(db.clone(), EventProducers::default());
    let broadcast = api.broadcast_order(&oid("9100")).await.unwrap();
    assert_eq!(broadcast.newly_added.len(), 2, "riders of both vendors must be notified");

    let t1 = {
        let db = db.clone();
        tokio::spawn(async move {
            let api = DispatchFlowApi::new(db, EventProducers::default());
            api.accept_order(&rid("r1"), &oid("9100")).await
        })
    };
    let t2 = {
        let db = db.clone();
        tokio::spawn(async move {
            let api = DispatchFlowApi::new(db, EventProducers::default());
            api.accept_order(&rid("r2"), &oid("9100")).await
        })
    };
    let (res1, res2) = (t1.await.unwrap(), t2.await.unwrap());
    assert_ne!(res1.is_ok(), res2.is_ok(), "exactly one of the two riders must win");

    let (winner, loss) = if res1.is_ok() { (rid("r1"), res2) } else { (rid("r2"), res1) };
    match loss.unwrap_err() {
        DispatchError::AlreadyAssigned { winner: w } => assert_eq!(w.id, winner),
        other => panic!("expected AlreadyAssigned, got {other:?}"),
    }

    let order = db.fetch_order_by_number(&oid("9100")).await.unwrap().unwrap();
    assert_eq!(order.rider_id, Some(winner.clone()));
    let requests = db.fetch_assignment_requests(order_id).await.unwrap();
    assert!(requests
        .iter()
        .all(|r| if r.rider_id == winner { r.status == RequestStatus::Accepted } else { r.status == RequestStatus::Expired }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn winner_is_never_displaced_by_late_accepts() {
    let db = new_test_db().await;
    seed_vendor(&db, "vend-a").await;
    seed_rider(&db, "r1", Some("vend-a")).await;
    seed_rider(&db, "r2", Some("vend-a")).await;
    seed_ready_order(&db, "9200", &["vend-a"]).await;

    let api = DispatchFlowApi::new(db.clone(), EventProducers::default());
    api.broadcast_order(&oid("9200")).await.unwrap();
    api.accept_order(&rid("r1"), &oid("9200")).await.unwrap();

    // serial stragglers, after the race is long over
    for _ in 0..3 {
        let err = api.accept_order(&rid("r2"), &oid("9200")).await.unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyAssigned { .. }), "got {err:?}");
        let order = db.fetch_order_by_number(&oid("9200")).await.unwrap().unwrap();
        assert_eq!(order.rider_id, Some(rid("r1")));
    }
}
