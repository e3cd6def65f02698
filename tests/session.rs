use stickwar::{
    command::KeywordMatcher,
    config::Config,
    engine::Command,
    player::Player,
    recorder::{self, RECORD_CONTRACT},
    types::{Frame, Grid, Recording},
};

fn row(grid: &Grid, y: usize) -> String {
    grid[y].iter().map(|c| c.ch).collect()
}

fn scripted_session() -> anyhow::Result<Recording> {
    let config = Config::default();
    let matcher = KeywordMatcher::new(&config.keywords);
    let script = recorder::parse_script(&["0.2:paf", "0:hop"], &matcher)?;
    assert_eq!(script[0].commands, vec![Command::Jump]);
    recorder::record(&config, 1.0, &script)
}

#[test]
fn recorded_session_replays_through_json() -> anyhow::Result<()> {
    let recording = scripted_session()?;
    let json = serde_json::to_string(&recording)?;
    let decoded: Recording = serde_json::from_str(&json)?;

    assert_eq!(decoded.contract, RECORD_CONTRACT);
    assert_eq!(decoded.frames.len(), recording.frames.len());
    assert_eq!(decoded.markers, recording.markers);
    assert!(matches!(decoded.frames[0], Frame::Full { .. }));

    let last = decoded.frames.len() - 1;
    let mut player = Player::new(decoded);
    player.seek(last);
    let grid = player.grid();
    assert_eq!(grid.len(), RECORD_CONTRACT.height as usize);
    assert!(
        grid.iter()
            .all(|r| r.len() == RECORD_CONTRACT.width as usize)
    );

    assert!(row(grid, 0).contains("StickWar"));
    assert!(row(grid, 22).contains("Last action: SHOOT!"));
    assert!(row(grid, 21).contains("Heard \"paf\""));
    Ok(())
}

#[test]
fn stepping_matches_seeking() -> anyhow::Result<()> {
    let recording = scripted_session()?;
    let mut stepped = Player::new(recording.clone());
    let mut sought = Player::new(recording);
    stepped.seek(0);

    let mut frame = 0;
    while stepped.step_forward() {
        frame += 1;
        if frame % 10 == 0 {
            sought.seek(frame);
            assert_eq!(stepped.grid(), sought.grid(), "frame {frame}");
        }
    }
    assert_eq!(stepped.current_frame(), 62);
    Ok(())
}

#[test]
fn markers_label_the_timeline() -> anyhow::Result<()> {
    let recording = scripted_session()?;
    assert_eq!(recording.marker_at(0), Some("JUMP!"));
    // 200 ms lands on tick 13 (208 ms).
    assert_eq!(recording.marker_at(12), Some("JUMP!"));
    assert_eq!(recording.marker_at(13), Some("SHOOT!"));
    Ok(())
}
