use broadside::{
    run_session_over, standard_ship_lengths, MatchOptions, PeerId, Side, StrategyRegistry,
    TcpTransport, Verbosity, TOTAL_SHIP_CELLS,
};
use rand::{rngs::SmallRng, SeedableRng};
use tokio::net::TcpListener;

#[tokio::test(flavor = "multi_thread")]
async fn match_over_tcp_reaches_the_same_end() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (client, accepted) = tokio::join!(TcpTransport::connect(addr), listener.accept());
    let (stream, _) = accepted?;
    let host = TcpTransport::new(stream);
    let guest = client?;

    let registry = StrategyRegistry::with_builtin();
    let lengths = standard_ship_lengths();
    let a = Side::prepare(&registry, "hunt", 20, &lengths, SmallRng::from_seed([0; 32]))?;
    let b = Side::prepare(&registry, "density", 20, &lengths, SmallRng::from_seed([1; 32]))?;
    let opts = MatchOptions {
        strategy_a: "hunt".into(),
        strategy_b: "density".into(),
        verbosity: Verbosity::HitsOnly,
        ..MatchOptions::default()
    };

    let report = run_session_over(a, b, Box::new(host), Box::new(guest), opts).await?;
    let result = report.result;

    assert_eq!(report.barriers_a, report.barriers_b);
    assert_eq!(report.barriers_a.last().copied(), Some(result.turns));
    assert_eq!(result.hits(result.winner) as usize, TOTAL_SHIP_CELLS);
    assert_eq!(result.strategy(PeerId::B), "density");
    // B's kept events crossed the wire inside its tally
    assert!(result.events.iter().any(|e| e.shooter == PeerId::A));
    assert!(result.events.iter().any(|e| e.shooter == PeerId::B));
    Ok(())
}
