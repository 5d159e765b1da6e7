/*!

This is the long-form manual for `match_scoring` and `ballotmatch`.

## Scoring

A voter answers a questionnaire made of policy options. For every option, the
voter says whether they want it (`selected: true`) or not (`selected: false`).

Experts have scored how much each candidate and each party agrees with each
option, on the following scale:

| score | meaning            |
|-------|--------------------|
| 0     | Strongly disagrees |
| 1     | Partially agrees   |
| 1.5   | Mostly agrees      |
| 2     | Strongly agrees    |

An entity _supports_ an option when its score is 1.5 or more. An option is a
match when the voter and the entity are on the same side: the voter wants it
and the entity supports it, or the voter does not want it and the entity does
not support it.

Options that the entity was not assessed on are left out entirely. They are
listed in the breakdown with an empty score, but they count neither as a match
nor as a scored option. A negative score is treated the same way.

The match percentage is the number of matches over the number of scored
options, rounded to the nearest integer (halves go up). When no option was
scored, the percentage is `-1` and is displayed as `N/A`.

## Color bands

| percentage                      | color    |
|---------------------------------|----------|
| `-1`                            | `grey`   |
| `>= greenThreshold`             | `green`  |
| `>= orangeThreshold`            | `orange` |
| anything else                   | `red`    |

The default thresholds are 70 and 40. The thresholds must be between 0 and 100.
The orange threshold is expected to be lower than the green one, but this is
not checked.

## Session files

`ballotmatch` reads one questionnaire session in JSON:

```text
{
  "selections": [ { "policyOptionId": "opt-1", "selected": true } ],
  "policyOptions": [
    { "id": "opt-1", "optionText": "Build more public housing",
      "question": { "category": { "name": "Housing" } } }
  ],
  "candidates": [
    { "id": "c1", "name": "Jane Citizen",
      "party": { "id": "p1", "name": "Example Party", "abbreviation": "EXP" } }
  ],
  "parties": [ { "id": "p1", "name": "Example Party", "abbreviation": "EXP" } ],
  "assessments": [
    { "policyOptionId": "opt-1", "agreementScore": 2, "candidateId": "c1" },
    { "policyOptionId": "opt-1", "agreementScore": 1.5, "partyId": "p1" }
  ]
}
```

Every assessment must carry exactly one of `candidateId` and `partyId`. Every
candidate and every party of the session gets a result, even without any
assessment.

## Configuration

The optional settings file (`--config`) follows the site settings:

```text
{
  "greenThreshold": 70,
  "orangeThreshold": 40,
  "matchGreenColor": "#22c55e",
  "matchOrangeColor": "#f97316",
  "matchRedColor": "#ef4444",
  "matchGreyColor": "#9ca3af"
}
```

All the keys are optional. The `--green-threshold` and `--orange-threshold`
flags take precedence over the file.

 */
