use std::fs;

use boxscore::{
    OfflineExtractor, Season, Table, clean_table,
    prepare::{PrepareOptions, prepare_game_logs},
    schema::SqlType,
};

const PLAYER_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div id="meta">
  <div>
    <h1><span>Anthony Davis</span></h1>
    <p><strong>Anthony Marshon Davis Jr.</strong></p>
    <p>(The Brow, AD)</p>
    <p><strong>Position:</strong> Power Forward and Center &#9642; <strong>Shoots:</strong> Right</p>
    <p><span>6-10</span>,&nbsp;<span>253lb</span>&nbsp;(208cm,&nbsp;115kg)</p>
    <p><strong>Team</strong>: <a href="/teams/DAL/2025.html">Dallas Mavericks</a></p>
    <p><strong>Born: </strong><span>March 11, 1993</span> <span>in&nbsp;Chicago,&nbsp;Illinois</span> <span class="f-i f-us">us</span></p>
    <p><strong>College:</strong> <a href="/friv/colleges.fcgi?college=kentucky">Kentucky</a></p>
    <p><strong>Draft:</strong> <a href="/teams/NOH/draft.html">New Orleans Hornets</a>, 1st round (1st pick, 1st overall), <a href="/draft/NBA_2012.html">2012 NBA Draft</a></p>
    <p><strong>Experience:</strong> 12 years</p>
  </div>
</div>
<table id="per_game">
  <thead><tr><th>Season</th><th>Age</th><th>Tm</th><th></th><th>PTS</th></tr></thead>
  <tbody>
    <tr><th>2012-13</th><td>19</td><td>NOH</td><td></td><td>13.5</td></tr>
    <tr class="thead"><th>Season</th><th>Age</th><th>Tm</th><th></th><th>PTS</th></tr>
    <tr><th>2013-14</th><td>20</td><td>NOP</td><td></td><td>20.8</td></tr>
  </tbody>
</table>
</body></html>"#;

#[test]
fn offline_extraction_writes_biography_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("player.html");
    fs::write(&snapshot, PLAYER_PAGE).unwrap();
    let out_dir = dir.path().join("data");

    let report = OfflineExtractor::new()
        .unwrap()
        .extract_file(&snapshot, &out_dir)
        .unwrap();
    assert_eq!(report.tables_written, [out_dir.join("per_game.csv")]);

    let info: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("player_info.json")).unwrap())
            .unwrap();
    assert_eq!(info["full_name"], "Anthony Davis");
    assert_eq!(info["nicknames"], serde_json::json!(["The Brow", "AD"]));
    assert_eq!(info["position"], "Power Forward and Center");
    assert_eq!(info["shoots"], "Right");
    assert_eq!(info["height_cm"], "208");
    assert_eq!(info["team"], "Dallas Mavericks");
    assert_eq!(info["birth_date"], "March 11, 1993");
    assert_eq!(info["birth_place"], "Chicago, Illinois");
    assert_eq!(info["college"], "Kentucky");
    assert_eq!(info["draft_team"], "New Orleans Hornets");
    assert_eq!(info["draft_overall"], "1");
    assert_eq!(info["draft_year"], "2012");
    assert_eq!(info["experience"], "12");

    let per_game = Table::read_csv(&out_dir.join("per_game.csv")).unwrap();
    assert_eq!(per_game.headers, ["Season", "Age", "Tm", "PTS"]);
    assert_eq!(per_game.len(), 2);
    assert_eq!(clean_table(per_game.clone()), per_game);
}

#[test]
fn prepare_writes_clean_logs_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("game_logs");
    fs::create_dir_all(&input_dir).unwrap();
    fs::write(
        input_dir.join("game_logs_2013.csv"),
        "G,Date,Age,Tm,,Opp,,GS,MP,FG,FG%,3P,+/-,PTS\n\
         2,2012-11-02,19-236,NOH,@,UTA,W (+2),1,34:10,5,.455,0,+4,14\n\
         ,2012-11-04,19-238,NOH,@,MIL,L (-4),Inactive,,,,,,\n\
         1,2012-10-31,19-234,NOH,,SAS,L (-4),0,28:45,8,.667,0,-10,21\n",
    )
    .unwrap();
    fs::write(input_dir.join("game_logs_2014.csv"), "Date,Opp\nnot a date,SAS\n").unwrap();

    let output_dir = dir.path().join("output");
    let sql_file = dir.path().join("db/create_game_logs_tables.sql");
    let prepared = prepare_game_logs(&PrepareOptions {
        input_dir,
        output_dir: output_dir.clone(),
        sql_file: sql_file.clone(),
        player_name: "Anthony Davis".to_string(),
    })
    .unwrap();

    // The malformed 2014 file is skipped, not fatal.
    assert_eq!(prepared.len(), 1);
    let season = &prepared[0];
    assert_eq!(season.season, Season::ending(2013));
    assert_eq!(season.schema.column_type("id"), Some(SqlType::Integer));
    assert_eq!(season.schema.column_type("date"), Some(SqlType::Timestamp));
    assert_eq!(season.schema.column_type("is_away"), Some(SqlType::Boolean));
    assert_eq!(season.schema.column_type("fg_pct"), Some(SqlType::Numeric));
    assert_eq!(season.schema.column_type("three_p"), Some(SqlType::Integer));
    assert_eq!(season.schema.column_type("plus_minus"), Some(SqlType::Integer));
    assert_eq!(season.schema.column_type("mp"), Some(SqlType::Text));

    let csv = fs::read_to_string(output_dir.join("game_logs_2012_2013.csv")).unwrap();
    assert_eq!(
        csv,
        "id,g,date,age,tm,is_away,opp,gs,mp,fg,fg_pct,three_p,plus_minus,pts\n\
         1,1,2012-10-31,19-234,NOH,false,SAS,0,28:45,8,.667,0,-10,21\n\
         2,2,2012-11-02,19-236,NOH,true,UTA,1,34:10,5,.455,0,+4,14\n"
    );

    let sql = fs::read_to_string(sql_file).unwrap();
    assert!(sql.starts_with("-- Anthony Davis Game Logs Tables\n\n-- 2012-2013 Season\n"));
    assert!(sql.contains("create table game_logs_2012_2013 (\n    id integer primary key,\n"));
    assert!(sql.contains("    is_away boolean,\n"));
    assert!(!sql.contains("game_logs_2013_2014"));
}
